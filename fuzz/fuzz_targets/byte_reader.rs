#![no_main]

use bytestream::ByteReader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = ByteReader::new(data);
    let mut idx = 0usize;

    // Use input bytes to drive a bounded sequence of reads.
    while idx < data.len() && idx < 1024 {
        let op = data[idx] % 8;
        idx += 1;

        match op {
            0 => {
                let _ = reader.read_u8();
            }
            1 => {
                let _ = reader.read_i16();
            }
            2 => {
                let _ = reader.read_u32();
            }
            3 => {
                let _ = reader.read_f64();
            }
            4 => {
                let _ = reader.read_number();
            }
            5 => {
                let _ = reader.read_str();
            }
            6 => {
                let _ = reader.read_bool();
            }
            _ => {
                let _ = reader.skip(usize::from(data[idx - 1] % 4));
            }
        }
        assert!(reader.offset() <= data.len());
    }
});
