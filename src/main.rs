//! The `veneer` command-line tool: build, extract, and detect payloads in
//! PNG and ICO files.
//!
//! Exit codes are small non-zero integers keyed to the failure site so
//! that scripts can tell apart, say, an unreadable input from a payload
//! that was not present; 0 is success.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;

use veneer::png::{ChunkTag, Text, ZText};
use veneer::util::{self, is_base64_string};
use veneer::{Error, IcoPayload, PngPayload};

#[derive(Parser, Debug)]
#[command(name = "veneer", version, about = "Embed and recover payloads inside PNG and ICO images")]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Build a new payload-bearing image.
  Create(CreateArgs),
  /// Extract payloads from an image into an output directory.
  Extract(ExtractArgs),
  /// Report which payload techniques an image appears to carry.
  Detect(DetectArgs),
}

#[derive(Args, Debug)]
struct CreateArgs {
  /// Input PNG or ICO file.
  #[arg(short, long)]
  input: PathBuf,

  /// Output file.
  #[arg(short, long)]
  output: PathBuf,

  /// File whose bytes are appended after the IEND chunk.
  #[arg(short = 'd', long)]
  trailing_data_payload: Option<PathBuf>,

  /// Keyword and file to embed as a base64 tEXt chunk (repeatable).
  #[arg(short = 't', long, num_args = 2, value_names = ["KEYWORD", "FILE"], action = ArgAction::Append)]
  text_section_payload: Vec<String>,

  /// Keyword and file to embed as a base64 zTXt chunk (repeatable).
  #[arg(short = 'z', long, num_args = 2, value_names = ["KEYWORD", "FILE"], action = ArgAction::Append)]
  ztxt_section_payload: Vec<String>,

  /// File to hide in the low nibbles of the pixel data.
  #[arg(short = 's', long)]
  stego_payload: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ExtractArgs {
  /// Input PNG or ICO file.
  #[arg(short, long)]
  input: PathBuf,

  /// Directory the recovered payloads are written into.
  #[arg(short, long)]
  output: PathBuf,

  /// Extract the trailing data payload.
  #[arg(short = 'd', long)]
  trailing_data_payload: bool,

  /// Extract tEXt payloads under this keyword (repeatable).
  #[arg(short = 't', long, value_name = "KEYWORD", action = ArgAction::Append)]
  text_section_payload: Vec<String>,

  /// Extract zTXt payloads under this keyword (repeatable).
  #[arg(short = 'z', long, value_name = "KEYWORD", action = ArgAction::Append)]
  ztxt_section_payload: Vec<String>,

  /// Extract the steganographic payload.
  #[arg(short = 's', long)]
  stego_payload: bool,

  /// Try every technique (the default when none is named).
  #[arg(short, long)]
  all: bool,
}

#[derive(Args, Debug)]
struct DetectArgs {
  /// Input PNG or ICO file.
  #[arg(short, long)]
  input: PathBuf,

  /// Check every technique (the default when none is named).
  #[arg(short = 'a', long)]
  auto_detect: bool,

  /// Check for trailing data.
  #[arg(short = 'd', long)]
  trailing_data: bool,

  /// Check for base64 tEXt payloads.
  #[arg(short = 't', long)]
  text_data: bool,

  /// Check for base64 zTXt payloads.
  #[arg(short = 'z', long)]
  ztxt_data: bool,

  /// Check for a steganographic payload.
  #[arg(short = 's', long)]
  stego_data: bool,

  /// Print a single machine-readable line instead of a report.
  #[arg(short, long)]
  minimal: bool,
}

fn status_normal(message: impl AsRef<str>) {
  println!("[+] {}", message.as_ref());
}

fn status_alert(message: impl AsRef<str>) {
  println!("[!] {}", message.as_ref());
}

fn status_error(message: impl AsRef<str>) {
  println!("[-] {}", message.as_ref());
}

/// The parsed input: a bare PNG, or an icon wrapping one.
enum Carrier {
  Png(Box<PngPayload>),
  Ico(Box<IcoPayload>),
}

impl Carrier {
  fn load(path: &Path) -> Result<Self, Error> {
    match PngPayload::open(path, true) {
      Ok(png) => Ok(Self::Png(Box::new(png))),
      Err(Error::BadSignature) => {
        status_normal("Not a PNG image. Trying to parse as an icon with an embedded PNG...");
        Ok(Self::Ico(Box::new(IcoPayload::open(path, true)?)))
      }
      Err(error) => Err(error),
    }
  }

  fn payload(&self) -> &PngPayload {
    match self {
      Self::Png(png) => png,
      Self::Ico(ico) => ico,
    }
  }

  fn payload_mut(&mut self) -> &mut PngPayload {
    match self {
      Self::Png(png) => png,
      Self::Ico(ico) => ico,
    }
  }

  fn replace_payload(&mut self, payload: PngPayload) {
    match self {
      Self::Png(png) => **png = payload,
      Self::Ico(ico) => ico.set_png(payload),
    }
  }

  fn save(&self, path: &Path) -> Result<(), Error> {
    match self {
      Self::Png(png) => png.save(path),
      Self::Ico(ico) => ico.save(path),
    }
  }
}

fn create(args: &CreateArgs) -> u8 {
  status_normal("Creating a new payload!");
  status_normal(format!("-> input file:  {}", args.input.display()));
  status_normal(format!("-> output file: {}", args.output.display()));

  if args.trailing_data_payload.is_none()
    && args.text_section_payload.is_empty()
    && args.ztxt_section_payload.is_empty()
    && args.stego_payload.is_none()
  {
    status_error("No payload type specified.");
    return 1;
  }

  status_normal(format!("Parsing {}...", args.input.display()));
  let mut carrier = match Carrier::load(&args.input) {
    Ok(carrier) => carrier,
    Err(error) => {
      status_error(format!("Failed to load input file: {error}"));
      return 2;
    }
  };
  status_alert("Image parsed!");

  if let Some(path) = &args.trailing_data_payload {
    status_normal(format!("Adding trailing data from \"{}\"...", path.display()));
    match util::read_file(path) {
      Ok(data) => carrier.payload_mut().set_trailing_data(data),
      Err(error) => {
        status_error(format!("Failed to read payload file: {error}"));
        return 3;
      }
    }
    status_alert("Trailing data added!");
  }

  for pair in args.text_section_payload.chunks(2) {
    let (keyword, file) = (&pair[0], &pair[1]);
    status_normal(format!("Adding tEXt payload \"{keyword}\" from \"{file}\"..."));
    let data = match util::read_file(file) {
      Ok(data) => data,
      Err(error) => {
        status_error(format!("Failed to read payload file: {error}"));
        return 4;
      }
    };
    if let Err(error) = carrier.payload_mut().add_text_payload(keyword, &data) {
      status_error(format!("Failed to add payload: {error}"));
      return 5;
    }
    status_alert("Payload added!");
  }

  for pair in args.ztxt_section_payload.chunks(2) {
    let (keyword, file) = (&pair[0], &pair[1]);
    status_normal(format!("Adding zTXt payload \"{keyword}\" from \"{file}\"..."));
    let data = match util::read_file(file) {
      Ok(data) => data,
      Err(error) => {
        status_error(format!("Failed to read payload file: {error}"));
        return 6;
      }
    };
    if let Err(error) = carrier.payload_mut().add_ztext_payload(keyword, &data) {
      status_error(format!("Failed to add payload: {error}"));
      return 7;
    }
    status_alert("Payload added!");
  }

  if let Some(path) = &args.stego_payload {
    status_normal(format!("Adding steganographic payload from \"{}\"...", path.display()));
    status_normal("This may take a moment, depending on the size of the image in pixels.");
    let result = util::read_file(path)
      .and_then(|data| carrier.payload().create_stego_payload(&data));
    match result {
      Ok(packed) => carrier.replace_payload(packed),
      Err(error) => {
        status_error(format!("Failed to create stego payload: {error}"));
        return 8;
      }
    }
    status_alert("Stego payload created!");
  }

  status_normal(format!("Saving payload to \"{}\"...", args.output.display()));
  if let Err(error) = carrier.save(&args.output) {
    status_error(format!("Failed to save payload: {error}"));
    return 9;
  }
  status_alert("Payload saved!");
  0
}

fn write_payload_file(directory: &Path, name: &str, data: &[u8]) -> Result<(), Error> {
  let path = directory.join(name);
  status_normal(format!("Saving \"{}\"...", path.display()));
  util::write_file(path, data)
}

fn extract(args: &ExtractArgs) -> u8 {
  status_normal("Attempting to extract payloads!");
  status_normal(format!("-> input file:       {}", args.input.display()));
  status_normal(format!("-> output directory: {}", args.output.display()));

  status_normal(format!("Parsing {}...", args.input.display()));
  let mut carrier = match Carrier::load(&args.input) {
    Ok(carrier) => carrier,
    Err(error) => {
      status_error(format!("Failed to load input file: {error}"));
      return 1;
    }
  };
  status_alert("Image parsed!");

  if std::fs::create_dir_all(&args.output).is_err() {
    status_error(format!("Failed to create output directory \"{}\"", args.output.display()));
    return 2;
  }

  let all_techniques = args.all
    || (!args.trailing_data_payload
      && args.text_section_payload.is_empty()
      && args.ztxt_section_payload.is_empty()
      && !args.stego_payload);
  if all_techniques {
    status_normal("Attempting to extract all techniques.");
  }

  let mut payloads_found = 0_usize;

  if all_techniques || args.trailing_data_payload {
    match carrier.payload().trailing_data() {
      Ok(data) => {
        status_alert("Found trailing data!");
        let data = data.to_vec();
        if write_payload_file(&args.output, "trailing_data.bin", &data).is_err() {
          status_error("Failed to save trailing data.");
          return 4;
        }
        payloads_found += 1;
      }
      Err(_) if all_techniques => status_normal("No trailing data present."),
      Err(_) => {
        status_error("No trailing data present.");
        return 3;
      }
    }
  }

  // with no keywords given, sweep every tEXt chunk that decodes as base64
  let text_payloads: Vec<Vec<u8>> = if all_techniques {
    carrier
      .payload()
      .get_chunks(ChunkTag::tEXt)
      .iter()
      .map(|chunk| Text::from_chunk(chunk.clone()).text())
      .filter(|text| is_base64_string(text))
      .filter_map(|text| util::base64_decode(&text).ok())
      .collect()
  } else {
    let mut collected = Vec::new();
    for keyword in &args.text_section_payload {
      match carrier.payload().extract_text_payloads(keyword) {
        Ok(payloads) => collected.extend(payloads),
        Err(error) => {
          status_error(format!("Failed to extract tEXt payloads for \"{keyword}\": {error}"));
          return 5;
        }
      }
    }
    collected
  };
  for (index, data) in text_payloads.iter().enumerate() {
    status_alert("Found a tEXt payload!");
    if write_payload_file(&args.output, &format!("text_payload_{index}.bin"), data).is_err() {
      status_error("Failed to save tEXt payload.");
      return 6;
    }
    payloads_found += 1;
  }

  let ztext_payloads: Vec<Vec<u8>> = if all_techniques {
    carrier
      .payload()
      .get_chunks(ChunkTag::zTXt)
      .iter()
      .filter_map(|chunk| ZText::from_chunk(chunk.clone()).text().ok())
      .filter(|text| is_base64_string(text))
      .filter_map(|text| util::base64_decode(&text).ok())
      .collect()
  } else {
    let mut collected = Vec::new();
    for keyword in &args.ztxt_section_payload {
      match carrier.payload().extract_ztext_payloads(keyword) {
        Ok(payloads) => collected.extend(payloads),
        Err(error) => {
          status_error(format!("Failed to extract zTXt payloads for \"{keyword}\": {error}"));
          return 7;
        }
      }
    }
    collected
  };
  for (index, data) in ztext_payloads.iter().enumerate() {
    status_alert("Found a zTXt payload!");
    if write_payload_file(&args.output, &format!("ztxt_payload_{index}.bin"), data).is_err() {
      status_error("Failed to save zTXt payload.");
      return 8;
    }
    payloads_found += 1;
  }

  if all_techniques || args.stego_payload {
    status_normal("Loading input to check for stego data...");
    if let Err(error) = carrier.payload_mut().load() {
      status_error(format!("Failed to load image data: {error}"));
      return 9;
    }
    match carrier.payload().has_stego_payload() {
      Ok(true) => {
        status_alert("Found stego payload!");
        match carrier.payload().extract_stego_payload() {
          Ok(data) => {
            if write_payload_file(&args.output, "stego_payload.bin", &data).is_err() {
              status_error("Failed to save stego payload.");
              return 12;
            }
            payloads_found += 1;
          }
          Err(error) => {
            status_error(format!("Failed to extract stego payload: {error}"));
            return 11;
          }
        }
      }
      Ok(false) if all_techniques => status_normal("No stego payload found."),
      Ok(false) => {
        status_error("No stego payload found.");
        return 10;
      }
      Err(error) => {
        status_error(format!("Failed to check for stego data: {error}"));
        return 11;
      }
    }
  }

  status_alert(format!("Done: {payloads_found} payload(s) extracted."));
  0
}

fn detect(args: &DetectArgs) -> u8 {
  let minimal = args.minimal;
  if !minimal {
    status_normal(format!("Inspecting {}...", args.input.display()));
  }

  let mut carrier = match Carrier::load(&args.input) {
    Ok(carrier) => carrier,
    Err(error) => {
      status_error(format!("Failed to load input file: {error}"));
      return 1;
    }
  };

  let auto_detect = args.auto_detect
    || (!args.trailing_data && !args.text_data && !args.ztxt_data && !args.stego_data);
  let mut report = Vec::new();

  if auto_detect || args.trailing_data {
    if !minimal {
      status_normal("Checking for trailing data...");
    }
    if carrier.payload().has_trailing_data() {
      if !minimal {
        status_alert("Trailing data present!");
      }
      report.push("trailing");
    } else if !minimal {
      status_normal("No trailing data present.");
    }
  }

  if auto_detect || args.text_data {
    if !minimal {
      status_normal("Checking for base64 tEXt payloads...");
    }
    let found = carrier
      .payload()
      .get_chunks(ChunkTag::tEXt)
      .iter()
      .any(|chunk| is_base64_string(&Text::from_chunk(chunk.clone()).text()));
    if found {
      if !minimal {
        status_alert("Base64 tEXt data present!");
      }
      report.push("text");
    } else if !minimal {
      status_normal("No base64 tEXt data present.");
    }
  }

  if auto_detect || args.ztxt_data {
    if !minimal {
      status_normal("Checking for base64 zTXt payloads...");
    }
    let found = carrier.payload().get_chunks(ChunkTag::zTXt).iter().any(|chunk| {
      ZText::from_chunk(chunk.clone()).text().is_ok_and(|text| is_base64_string(&text))
    });
    if found {
      if !minimal {
        status_alert("Base64 zTXt data present!");
      }
      report.push("ztxt");
    } else if !minimal {
      status_normal("No base64 zTXt data present.");
    }
  }

  if auto_detect || args.stego_data {
    if !minimal {
      status_normal("Checking for stego payload...");
      status_normal("Loading input to check for stego data...");
    }
    let has_stego = match carrier.payload_mut().load() {
      Ok(()) => carrier.payload().has_stego_payload().unwrap_or(false),
      Err(_) => false,
    };
    if has_stego {
      if !minimal {
        status_alert("Stego data present!");
      }
      report.push("stego");
    } else if !minimal {
      status_normal("No stego data present.");
    }
  }

  if minimal {
    println!("{}", report.join(","));
  } else if report.is_empty() {
    status_normal("No payloads detected.");
  } else {
    status_alert(format!("Detected payload technique(s): {}", report.join(", ")));
  }
  0
}

fn main() -> ExitCode {
  tracing_subscriber::fmt::init();
  let cli = Cli::parse();
  debug!(?cli, "parsed arguments");
  let code = match &cli.command {
    Command::Create(args) => create(args),
    Command::Extract(args) => extract(args),
    Command::Detect(args) => detect(args),
  };
  ExitCode::from(code)
}
