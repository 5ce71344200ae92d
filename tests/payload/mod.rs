use veneer::{Error, PngPayload};

#[test]
fn test_trailing_data_payload() {
  let (bytes, _) = super::rgba_test_png(16, 16);
  let mut payload = PngPayload::parse(&bytes, true).unwrap();
  payload.set_trailing_data(b"Hello, Facade!".to_vec());

  let reparsed = PngPayload::parse(&payload.to_bytes(), true).unwrap();
  assert!(reparsed.has_trailing_data());
  assert_eq!(reparsed.trailing_data().unwrap(), b"Hello, Facade!");
}

#[test]
fn test_text_payload_round_trip() {
  let secret = b"This could also contain some arbitrary data!";
  let (bytes, _) = super::rgba_test_png(16, 16);
  let mut payload = PngPayload::parse(&bytes, true).unwrap();
  assert!(!payload.has_text());
  payload.add_text_payload("FACADE", secret).unwrap();

  let reparsed = PngPayload::parse(&payload.to_bytes(), true).unwrap();
  assert!(reparsed.has_text());
  let extracted = reparsed.extract_text_payloads("FACADE").unwrap();
  assert_eq!(extracted.len(), 1);
  assert_eq!(extracted[0], secret);
}

#[test]
fn test_ztext_payload_round_trip() {
  let secret = b"This payload is compressed!";
  let (bytes, _) = super::rgba_test_png(16, 16);
  let mut payload = PngPayload::parse(&bytes, true).unwrap();
  assert!(!payload.has_ztext());
  payload.add_ztext_payload("FACADE", secret).unwrap();

  let reparsed = PngPayload::parse(&payload.to_bytes(), true).unwrap();
  assert!(reparsed.has_ztext());
  let extracted = reparsed.extract_ztext_payloads("FACADE").unwrap();
  assert_eq!(extracted.len(), 1);
  assert_eq!(extracted[0], secret);
}

#[test]
fn test_stego_payload_survives_the_codec() {
  // random bytes barely compress, which keeps the capacity check honest
  let secret = super::rand_bytes(1024);
  let (bytes, _) = super::rgba_test_png(64, 64);
  let payload = PngPayload::parse(&bytes, true).unwrap();

  let packed = payload.create_stego_payload(&secret).unwrap();
  let saved = packed.to_bytes();

  // the payload must survive serialise -> parse -> inflate -> reconstruct
  let mut reparsed = PngPayload::parse(&saved, true).unwrap();
  reparsed.load().unwrap();
  assert!(reparsed.has_stego_payload().unwrap());
  assert_eq!(reparsed.extract_stego_payload().unwrap(), secret);
}

#[test]
fn test_stego_payload_of_a_whole_png_file() {
  // hide one PNG inside another, the way the tool's own tests do
  let (host, _) = super::rgba_test_png(128, 128);
  let (hidden, _) = super::rgba_test_png(16, 16);

  let payload = PngPayload::parse(&host, true).unwrap();
  let packed = payload.create_stego_payload(&hidden).unwrap();

  let mut reparsed = PngPayload::parse(&packed.to_bytes(), true).unwrap();
  reparsed.load().unwrap();
  assert_eq!(reparsed.extract_stego_payload().unwrap(), hidden);
}

#[test]
fn test_stego_absent_reports_cleanly() {
  let (bytes, _) = super::rgba_test_png(16, 16);
  let mut payload = PngPayload::parse(&bytes, true).unwrap();
  payload.load().unwrap();
  assert!(!payload.has_stego_payload().unwrap());
  assert_eq!(payload.extract_stego_payload().unwrap_err(), Error::NoStegoData);
}

#[test]
fn test_stego_requires_loaded_image() {
  let (bytes, _) = super::rgba_test_png(16, 16);
  let payload = PngPayload::parse(&bytes, true).unwrap();
  assert_eq!(payload.has_stego_payload().unwrap_err(), Error::NoImageData);
}

#[test]
fn test_all_four_carriers_together() {
  let stego_secret = super::rand_bytes(256);
  let (bytes, expected_raw) = super::rgba_test_png(64, 64);

  let mut payload = PngPayload::parse(&bytes, true).unwrap();
  payload.set_trailing_data(b"after the end".to_vec());
  payload.add_text_payload("ONE", b"plain text carrier").unwrap();
  payload.add_ztext_payload("TWO", b"compressed text carrier").unwrap();
  let packed = payload.create_stego_payload(&stego_secret).unwrap();

  let mut reparsed = PngPayload::parse(&packed.to_bytes(), true).unwrap();
  reparsed.load().unwrap();
  assert_eq!(reparsed.trailing_data().unwrap(), b"after the end");
  assert_eq!(reparsed.extract_text_payloads("ONE").unwrap()[0], b"plain text carrier");
  assert_eq!(
    reparsed.extract_ztext_payloads("TWO").unwrap()[0],
    b"compressed text carrier"
  );
  assert_eq!(reparsed.extract_stego_payload().unwrap(), stego_secret);

  // the stego write only touched low nibbles, never layout
  assert_eq!(super::loaded_raw_bytes(&reparsed).len(), expected_raw.len());
}

#[test]
fn test_stego_capacity_is_enforced_end_to_end() {
  let (bytes, _) = super::rgba_test_png(8, 8);
  let payload = PngPayload::parse(&bytes, true).unwrap();
  // 8*8 pixels give 96 bytes of nibble capacity; ask for far more
  let oversized = super::rand_bytes(4096);
  assert!(matches!(
    payload.create_stego_payload(&oversized).unwrap_err(),
    Error::ImageTooSmall { have: 96, need: _ }
  ));
}
