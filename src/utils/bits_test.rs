use super::*;

#[test]
fn test_read_across_bytes() {
    let data = [0b1011_0011, 0b0101_1010];
    let mut reader = BitReader::new(&data);

    assert_eq!(reader.read_bits(3).unwrap(), 0b101);
    assert_eq!(reader.read_bits(7).unwrap(), 0b10011_01);
    assert_eq!(reader.available_bits(), 6);
    assert_eq!(reader.read_bits(0).unwrap(), 0);
}

#[test]
fn test_skip_and_align() {
    let data = [0b1011_0011, 0b0101_1010];
    let mut reader = BitReader::new(&data);

    reader.skip_bits(3).unwrap();
    reader.align_byte();
    assert_eq!(reader.read_bits(8).unwrap(), 0b0101_1010);
    reader.align_byte();
    assert_eq!(reader.available_bits(), 0);
}

#[test]
fn test_reader_bounds() {
    let data = [0xFF];
    let mut reader = BitReader::new(&data);

    reader.read_bits(6).unwrap();
    assert!(reader.read_bits(3).is_err());
    assert!(reader.skip_bits(3).is_err());
    assert_eq!(reader.read_bits(2).unwrap(), 0b11);
    assert!(reader.read_bit().is_err());

    let mut reader = BitReader::new(&[0; 8]);
    assert!(reader.read_bits(33).is_err());
}

#[test]
fn test_writer_packs_msb_first() {
    let mut writer = BitWriter::new();
    writer.write_bits(0xFFF, 12);
    writer.write_bit(false);
    writer.write_bits(0, 2);
    writer.write_bit(true);
    assert_eq!(writer.bit_len(), 16);
    assert_eq!(writer.into_bytes(), vec![0xFF, 0xF1]);
}

#[test]
fn test_writer_masks_and_pads() {
    let mut writer = BitWriter::with_capacity(1);
    writer.write_bits(0xFF, 3);
    assert_eq!(writer.into_bytes(), vec![0b1110_0000]);
}

#[test]
fn test_reader_reads_what_writer_wrote() {
    let fields = [(1u32, 1u32), (0x5A, 7), (0x1FFF, 13), (0, 2), (0x7FF, 11), (3, 2)];
    let mut writer = BitWriter::new();
    for &(value, width) in &fields {
        writer.write_bits(value, width);
    }
    let bytes = writer.into_bytes();

    let mut reader = BitReader::new(&bytes);
    for &(value, width) in &fields {
        assert_eq!(reader.read_bits(width).unwrap(), value);
    }
}
