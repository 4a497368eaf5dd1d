#![no_main]

use libfuzzer_sys::fuzz_target;
use searchdex::utils::base85;

fuzz_target!(|data: &[u8]| {
    let encoded = base85::encode(data);
    let decoded = base85::decode(&encoded).expect("encoded text must decode");
    // Decoding yields the zero-padded input
    assert_eq!(&decoded[..data.len()], data);
    assert!(decoded[data.len()..].iter().all(|&b| b == 0));

    if let Ok(text) = std::str::from_utf8(data) {
        let _ = base85::decode(text);
    }
});
