use veneer::ico::{EntryType, Icon, IconDirEntry};
use veneer::IcoPayload;

/// An icon holding the given PNG as its first entry and a fake BMP as its
/// second.
fn test_icon(png_bytes: &[u8]) -> Vec<u8> {
  let mut icon = Icon::new();
  let entry = IconDirEntry { width: 64, height: 64, bit_count: 32, ..IconDirEntry::default() };
  icon.append_entry((entry, png_bytes.to_vec()));
  let entry = IconDirEntry { width: 16, height: 16, bit_count: 4, ..IconDirEntry::default() };
  icon.append_entry((entry, b"BM\x00\x01 stand-in bitmap bits".to_vec()));
  icon.to_bytes().unwrap()
}

#[test]
fn test_icon_entry_types() {
  let (png, _) = super::rgba_test_png(16, 16);
  let bytes = test_icon(&png);
  let icon = Icon::parse(&bytes).unwrap();
  assert_eq!(icon.len(), 2);
  assert_eq!(icon.entry_type(0).unwrap(), EntryType::Png);
  assert_eq!(icon.entry_type(1).unwrap(), EntryType::Bmp);
  assert_eq!(icon.first_png_entry().unwrap(), 0);
}

#[test]
fn test_ico_payload_carries_all_techniques() {
  let stego_secret = super::rand_bytes(512);
  let (png, _) = super::rgba_test_png(64, 64);
  let bytes = test_icon(&png);

  let mut ico = IcoPayload::parse(&bytes, true).unwrap();
  assert_eq!(ico.png_index(), 0);

  // apply every carrier to the embedded PNG, stego last so the packed
  // image carries the other three
  ico.set_trailing_data(b"Hello, Facade!".to_vec());
  ico.add_text_payload("FACADE", b"This could also contain some arbitrary data!").unwrap();
  ico.add_ztext_payload("FACADE", b"This payload is compressed!").unwrap();
  let packed = ico.create_stego_payload(&stego_secret).unwrap();
  ico.set_png(packed);

  // reassemble the icon and verify every payload from a clean parse
  let reassembled = ico.to_bytes().unwrap();
  let mut reparsed = IcoPayload::parse(&reassembled, true).unwrap();
  assert_eq!(reparsed.icon().len(), 2);
  assert_eq!(reparsed.icon().entry_type(0).unwrap(), EntryType::Png);
  assert_eq!(reparsed.icon().entry_type(1).unwrap(), EntryType::Bmp);

  assert_eq!(reparsed.trailing_data().unwrap(), b"Hello, Facade!");
  assert_eq!(
    reparsed.extract_text_payloads("FACADE").unwrap()[0],
    b"This could also contain some arbitrary data!"
  );
  assert_eq!(
    reparsed.extract_ztext_payloads("FACADE").unwrap()[0],
    b"This payload is compressed!"
  );
  reparsed.load().unwrap();
  assert!(reparsed.has_stego_payload().unwrap());
  assert_eq!(reparsed.extract_stego_payload().unwrap(), stego_secret);

  // the BMP entry rode along untouched
  assert_eq!(reparsed.icon().get_entry(1).unwrap().1, b"BM\x00\x01 stand-in bitmap bits");
}

#[test]
fn test_ico_set_writes_back_into_the_entry() {
  let (png, _) = super::rgba_test_png(16, 16);
  let bytes = test_icon(&png);
  let mut ico = IcoPayload::parse(&bytes, true).unwrap();
  ico.set_trailing_data(b"tail".to_vec());
  ico.set().unwrap();
  let entry_bytes = ico.icon().get_entry(0).unwrap().1.clone();
  assert!(entry_bytes.ends_with(b"tail"));
}
