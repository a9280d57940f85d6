#[cfg(test)]
mod tests {
    use bytes::{BufMut, Bytes, BytesMut};
    use lstk::av::{AccessUnit, Demuxer, FormatDescription, Muxer, StreamInfo, StreamType};
    use lstk::codec::aac::{AACConfig, ADTS_HEADER_SIZE};
    use lstk::config::TSConfig;
    use lstk::error::Result;
    use lstk::format::ts::{
        TSDemuxer, TSMuxer, TSPacket, TSReader, TSWriter, TS_PACKET_SIZE, TS_PAYLOAD_SIZE,
    };
    use pretty_assertions::assert_eq;
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;
    use std::io::Cursor;
    use std::time::Duration;

    /// Length-prefixed single NAL unit with no zero bytes in the body.
    fn iso_nal(header: u8, len: usize, seed: u8) -> Bytes {
        let mut data = BytesMut::with_capacity(len + 4);
        data.put_u32(len as u32);
        data.put_u8(header);
        data.extend((1..len).map(|i| ((i + seed as usize) % 255 + 1) as u8));
        data.freeze()
    }

    fn writer() -> TSWriter {
        let mut writer = TSWriter::with_config(TSConfig::default());
        writer.set_base_timestamp(Duration::ZERO);
        writer
    }

    fn round_trip(writer: &mut TSWriter, units: &[AccessUnit]) -> Result<Vec<AccessUnit>> {
        let mut reader = TSReader::new();
        let mut received = Vec::new();
        for unit in units {
            received.extend(reader.read(&writer.write_bytes(unit)?));
        }
        received.extend(reader.flush());
        Ok(received)
    }

    #[derive(Debug, Clone)]
    struct VideoCase {
        stream_type: StreamType,
        len: usize,
        seed: u8,
        pts_ms: u64,
        dts_back_ms: Option<u64>,
        is_sync: bool,
    }

    impl Arbitrary for VideoCase {
        fn arbitrary(g: &mut Gen) -> Self {
            VideoCase {
                stream_type: if bool::arbitrary(g) {
                    StreamType::H264
                } else {
                    StreamType::H265
                },
                len: 2 + usize::arbitrary(g) % 3000,
                seed: u8::arbitrary(g),
                pts_ms: u64::arbitrary(g) % 80_000_000,
                dts_back_ms: Option::<u8>::arbitrary(g).map(u64::from),
                is_sync: bool::arbitrary(g),
            }
        }
    }

    impl VideoCase {
        fn unit(&self) -> AccessUnit {
            let header = match (self.stream_type, self.is_sync) {
                (StreamType::H264, true) => 0x65,
                (StreamType::H264, false) => 0x41,
                (_, true) => 0x26,
                (_, false) => 0x02,
            };
            let pts = Duration::from_millis(self.pts_ms);
            let mut unit = AccessUnit::new(self.stream_type, iso_nal(header, self.len, self.seed))
                .with_pts(pts)
                .with_sync_flag(self.is_sync);
            if let Some(back) = self.dts_back_ms {
                unit = unit.with_dts(pts.saturating_sub(Duration::from_millis(back)));
            }
            if self.is_sync {
                let parameter_sets = match self.stream_type {
                    StreamType::H264 => vec![
                        Bytes::from_static(&[0x67, 0x64, 0x00, 0x1F, 0xAC]),
                        Bytes::from_static(&[0x68, 0xEE, 0x3C, 0xB0]),
                    ],
                    _ => vec![
                        Bytes::from_static(&[0x40, 0x01, 0x0C, 0x01]),
                        Bytes::from_static(&[0x42, 0x01, 0x01, 0x01]),
                        Bytes::from_static(&[0x44, 0x01, 0xC1, 0x72]),
                    ],
                };
                unit = unit.with_parameter_sets(parameter_sets);
            }
            unit
        }
    }

    #[quickcheck]
    fn prop_video_access_unit_round_trip(case: VideoCase) -> bool {
        let unit = case.unit();
        let mut writer = writer();
        if writer.add_stream_type(case.stream_type, None).is_err() {
            return false;
        }
        match round_trip(&mut writer, std::slice::from_ref(&unit)) {
            Ok(received) => received == vec![unit],
            Err(_) => false,
        }
    }

    #[test]
    fn test_audio_access_unit_round_trip() -> Result<()> {
        let config = AACConfig::default();
        let mut writer = writer();
        writer.add_stream_type(StreamType::AdtsAac, Some(FormatDescription::Audio(config.clone())))?;

        let sent: Vec<AccessUnit> = (0..10u64)
            .map(|i| {
                AccessUnit::new(StreamType::AdtsAac, vec![0x21 + i as u8; 100 + i as usize * 13])
                    .with_pts(Duration::from_millis(1_000 + i * 23))
            })
            .collect();
        let received = round_trip(&mut writer, &sent)?;

        assert_eq!(received.len(), sent.len());
        for (got, want) in received.iter().zip(&sent) {
            assert_eq!(got.pts, want.pts);
            assert_eq!(got.dts, None);
            assert!(got.is_sync);
            let header = config.adts_header(want.data.len()).to_bytes();
            assert_eq!(&got.data[..ADTS_HEADER_SIZE], &header[..]);
            assert_eq!(&got.data[ADTS_HEADER_SIZE..], &want.data[..]);
        }
        Ok(())
    }

    #[test]
    fn test_three_adts_frames_in_one_unit() -> Result<()> {
        let config = AACConfig::default();
        let mut payload = Vec::new();
        for (size, fill) in [(200usize, 0x11u8), (210, 0x22), (195, 0x33)] {
            payload.extend(config.adts_header(size - ADTS_HEADER_SIZE).to_bytes());
            payload.extend(std::iter::repeat(fill).take(size - ADTS_HEADER_SIZE));
        }

        let mut writer = writer();
        writer.add_stream_type(StreamType::AdtsAac, None)?;
        let unit = AccessUnit::new(StreamType::AdtsAac, payload);
        let received = round_trip(&mut writer, &[unit])?;

        let sizes: Vec<usize> = received.iter().map(|u| u.data.len()).collect();
        assert_eq!(sizes, vec![200, 210, 195]);
        let fills: Vec<u8> = received.iter().map(|u| u.data[ADTS_HEADER_SIZE]).collect();
        assert_eq!(fills, vec![0x11, 0x22, 0x33]);
        assert!(received.windows(2).all(|w| w[0].pts < w[1].pts));
        Ok(())
    }

    #[test]
    fn test_interleaved_audio_video() -> Result<()> {
        let mut writer = writer();
        writer.add_stream_type(StreamType::H264, None)?;
        writer.add_stream_type(StreamType::AdtsAac, None)?;

        let mut sent = Vec::new();
        for i in 0..6u64 {
            let sync = i % 3 == 0;
            let header = if sync { 0x65 } else { 0x41 };
            let mut video = AccessUnit::new(StreamType::H264, iso_nal(header, 900, i as u8))
                .with_pts(Duration::from_millis(i * 40))
                .with_sync_flag(sync);
            if sync {
                video = video.with_parameter_sets(vec![Bytes::from_static(&[0x67, 0x42, 0x1E])]);
            }
            sent.push(video);
            sent.push(
                AccessUnit::new(StreamType::AdtsAac, vec![0x5A; 150])
                    .with_pts(Duration::from_millis(i * 40 + 5)),
            );
        }
        let received = round_trip(&mut writer, &sent)?;

        let video: Vec<&AccessUnit> = received.iter().filter(|u| u.stream_type.is_video()).collect();
        let audio: Vec<&AccessUnit> = received.iter().filter(|u| !u.stream_type.is_video()).collect();
        assert_eq!(video.len(), 6);
        assert_eq!(audio.len(), 6);
        for (i, unit) in video.iter().enumerate() {
            assert_eq!(unit.data, sent[i * 2].data);
            assert_eq!(unit.is_sync, i % 3 == 0);
            if i > 0 {
                assert_eq!(unit.duration, Some(Duration::from_millis(40)));
            }
        }
        Ok(())
    }

    #[test]
    fn test_video_starting_behind_audio_keeps_timeline() -> Result<()> {
        let mut writer = TSWriter::with_config(TSConfig::default());
        writer.add_stream_type(StreamType::H264, None)?;
        writer.add_stream_type(StreamType::AdtsAac, None)?;

        let audio = AccessUnit::new(StreamType::AdtsAac, vec![0x33; 120])
            .with_pts(Duration::from_millis(1_000));
        let video = AccessUnit::new(StreamType::H264, iso_nal(0x65, 400, 3))
            .with_pts(Duration::from_millis(1_050))
            .with_dts(Duration::from_millis(950))
            .with_sync_flag(true);
        let received = round_trip(&mut writer, &[audio, video])?;
        assert_eq!(received.len(), 2);

        let audio = &received[0];
        let video = &received[1];
        assert_eq!(audio.stream_type, StreamType::AdtsAac);
        assert_eq!(video.stream_type, StreamType::H264);

        let dts = video.dts.expect("video keeps its DTS");
        assert!(dts < video.pts);
        assert_eq!(video.pts - dts, Duration::from_millis(100));
        assert_eq!(video.pts - audio.pts, Duration::from_millis(50));
        assert!(video.pts < Duration::from_secs(1));
        Ok(())
    }

    fn payload_bytes(packets: &[TSPacket]) -> Vec<u8> {
        packets.iter().flat_map(|p| p.payload.iter().copied()).collect()
    }

    #[test]
    fn test_segmentation_reproduces_payload() -> Result<()> {
        let mut writer = writer();
        writer.add_stream_type(StreamType::H264, None)?;
        writer.write_psi()?;

        for len in [1usize, 150, 160, 161, 162, 344, 345, 346, 2000, 20_000] {
            let unit = AccessUnit::new(StreamType::H264, iso_nal(0x41, len, 7));
            let packets = writer.write(&unit)?;
            let pes = lstk::format::ts::PacketizedElementaryStream::from_video(
                &unit,
                None,
                Duration::ZERO,
            )?;
            let encoded = pes.to_bytes();

            // Only the first packet can carry a PCR
            let pcr_size = packets[0].adaptation_field.as_ref().map_or(0, |f| {
                if f.pcr.is_some() {
                    8
                } else {
                    0
                }
            });
            let first = TS_PAYLOAD_SIZE - pcr_size;
            let expected = if encoded.len() <= first {
                1
            } else {
                1 + (encoded.len() - first).div_ceil(TS_PAYLOAD_SIZE)
            };
            assert_eq!(packets.len(), expected, "payload of {} bytes", encoded.len());
            assert_eq!(payload_bytes(&packets), encoded.to_vec());
            for packet in &packets {
                assert_eq!(packet.to_bytes()?.len(), TS_PACKET_SIZE);
            }
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_async_mux_demux() -> Result<()> {
        let mut muxer = TSMuxer::with_config(Cursor::new(Vec::new()), TSConfig::default());
        muxer.ts_writer().set_base_timestamp(Duration::ZERO);
        let streams = vec![
            StreamInfo::new(0x100, StreamType::H265),
            StreamInfo::new(0x101, StreamType::AdtsAac),
        ];
        muxer.write_header(&streams).await?;

        let mut sent = Vec::new();
        for i in 0..20u64 {
            let sync = i % 10 == 0;
            let mut unit = AccessUnit::new(
                StreamType::H265,
                iso_nal(if sync { 0x26 } else { 0x02 }, 500 + i as usize * 311, i as u8),
            )
            .with_pts(Duration::from_millis(100 + i * 33))
            .with_dts(Duration::from_millis(i * 33))
            .with_sync_flag(sync);
            if sync {
                unit = unit.with_parameter_sets(vec![
                    Bytes::from_static(&[0x40, 0x01, 0x0C]),
                    Bytes::from_static(&[0x42, 0x01, 0x01]),
                    Bytes::from_static(&[0x44, 0x01, 0xC1]),
                ]);
            }
            sent.push(unit.clone());
            muxer.write_packet(unit).await?;
        }
        muxer.write_trailer().await?;
        let bytes = muxer.into_inner().into_inner();

        let mut demuxer = TSDemuxer::new(Cursor::new(bytes));
        assert_eq!(demuxer.streams().await?, streams);

        let mut received = Vec::new();
        while let Some(unit) = demuxer.read_packet().await? {
            received.push(unit);
        }
        assert_eq!(received.len(), sent.len());
        for (got, want) in received.iter().zip(&sent) {
            assert_eq!(got.data, want.data);
            assert_eq!(got.pts, want.pts);
            assert_eq!(got.dts, want.dts);
            assert_eq!(got.is_sync, want.is_sync);
            assert_eq!(got.parameter_sets, want.parameter_sets);
        }
        Ok(())
    }
}
