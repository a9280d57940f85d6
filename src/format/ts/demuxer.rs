use super::reader::TSReader;
use super::types::TS_PACKET_SIZE;
use crate::av::{AccessUnit, Demuxer, StreamInfo, StreamType};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Number of TS packets requested per read.
const READ_PACKETS: usize = 64;

/// MPEG Transport Stream demuxer reading from any async byte source.
///
/// Streams are learned from PAT/PMT. End of input flushes unbounded PES
/// packets still being accumulated.
pub struct TSDemuxer<R: AsyncRead + Unpin + Send> {
    reader: R,
    ts: TSReader,
    pending: VecDeque<AccessUnit>,
    buf: Vec<u8>,
    eof: bool,
}

impl<R: AsyncRead + Unpin + Send> TSDemuxer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            ts: TSReader::new(),
            pending: VecDeque::new(),
            buf: vec![0u8; TS_PACKET_SIZE * READ_PACKETS],
            eof: false,
        }
    }

    /// Demuxes `pid` as `stream_type` for inputs without PSI.
    pub fn register_stream(&mut self, pid: u16, stream_type: StreamType) {
        self.ts.register_stream(pid, stream_type);
    }

    async fn fill(&mut self) -> Result<()> {
        let n = self.reader.read(&mut self.buf).await?;
        if n == 0 {
            self.eof = true;
            self.pending.extend(self.ts.flush());
        } else {
            self.pending.extend(self.ts.read(&self.buf[..n]));
        }
        Ok(())
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> Demuxer for TSDemuxer<R> {
    async fn read_packet(&mut self) -> Result<Option<AccessUnit>> {
        loop {
            if let Some(unit) = self.pending.pop_front() {
                return Ok(Some(unit));
            }
            if self.eof {
                return Ok(None);
            }
            self.fill().await?;
        }
    }

    async fn streams(&mut self) -> Result<Vec<StreamInfo>> {
        while !self.ts.has_program() && !self.eof {
            self.fill().await?;
        }
        Ok(self.ts.streams())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::av::Muxer;
    use crate::config::TSConfig;
    use crate::format::ts::muxer::TSMuxer;
    use std::io::Cursor;
    use std::time::Duration;

    #[test]
    fn test_ts_demuxer_basic() {
        tokio_test::block_on(async {
            let mut muxer = TSMuxer::with_config(Cursor::new(Vec::new()), TSConfig::default());
            muxer.ts_writer().set_base_timestamp(Duration::ZERO);
            muxer
                .write_header(&[StreamInfo::new(0, StreamType::AdtsAac)])
                .await
                .unwrap();
            for i in 0..3u64 {
                let unit = AccessUnit::new(StreamType::AdtsAac, vec![0x21; 120])
                    .with_pts(Duration::from_millis(i * 20));
                muxer.write_packet(unit).await.unwrap();
            }
            muxer.write_trailer().await.unwrap();
            let bytes = muxer.into_inner().into_inner();

            let mut demuxer = TSDemuxer::new(Cursor::new(bytes));
            let streams = demuxer.streams().await.unwrap();
            assert_eq!(streams, vec![StreamInfo::new(0x101, StreamType::AdtsAac)]);

            let mut pts = Vec::new();
            while let Some(unit) = demuxer.read_packet().await.unwrap() {
                assert_eq!(unit.data.len(), 127);
                pts.push(unit.pts);
            }
            assert_eq!(
                pts,
                vec![Duration::ZERO, Duration::from_millis(20), Duration::from_millis(40)]
            );
            assert!(demuxer.read_packet().await.unwrap().is_none());
        });
    }

    #[test]
    fn test_empty_input() {
        tokio_test::block_on(async {
            let mut demuxer = TSDemuxer::new(Cursor::new(Vec::<u8>::new()));
            assert!(demuxer.streams().await.unwrap().is_empty());
            assert!(demuxer.read_packet().await.unwrap().is_none());
        });
    }
}
