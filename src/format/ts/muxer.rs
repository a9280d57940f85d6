use super::types::TS_PACKET_SIZE;
use super::writer::TSWriter;
use crate::av::{AccessUnit, Muxer, StreamInfo};
use crate::config::TSConfig;
use crate::error::Result;
use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

/// MPEG Transport Stream muxer writing to any async byte sink.
///
/// Streams declared with PID `0` are placed on the configured video or audio
/// PID.
pub struct TSMuxer<W: AsyncWrite + Unpin + Send> {
    writer: BufWriter<W>,
    ts: TSWriter,
    buf: BytesMut,
}

impl<W: AsyncWrite + Unpin + Send> TSMuxer<W> {
    pub fn new(writer: W) -> Self {
        Self::with_writer(writer, TSWriter::new())
    }

    pub fn with_config(writer: W, config: TSConfig) -> Self {
        Self::with_writer(writer, TSWriter::with_config(config))
    }

    fn with_writer(writer: W, ts: TSWriter) -> Self {
        Self {
            writer: BufWriter::new(writer),
            ts,
            buf: BytesMut::with_capacity(TS_PACKET_SIZE * 8),
        }
    }

    /// Access to the underlying packetizer, e.g. to pin the base timestamp.
    pub fn ts_writer(&mut self) -> &mut TSWriter {
        &mut self.ts
    }

    pub fn mark_discontinuity(&mut self) {
        self.ts.mark_discontinuity();
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> Muxer for TSMuxer<W> {
    async fn write_header(&mut self, streams: &[StreamInfo]) -> Result<()> {
        for stream in streams {
            if stream.pid == 0 {
                self.ts
                    .add_stream_type(stream.stream_type, stream.format.clone())?;
            } else {
                self.ts.add_stream(stream.clone())?;
            }
        }

        self.buf.clear();
        for packet in self.ts.write_psi()? {
            packet.write_to(&mut self.buf)?;
        }
        self.writer.write_all(&self.buf).await?;
        Ok(())
    }

    async fn write_packet(&mut self, unit: AccessUnit) -> Result<()> {
        self.buf.clear();
        for packet in self.ts.write(&unit)? {
            packet.write_to(&mut self.buf)?;
        }
        self.writer.write_all(&self.buf).await?;
        Ok(())
    }

    async fn write_trailer(&mut self) -> Result<()> {
        self.writer.flush().await?;
        Ok(())
    }
}
