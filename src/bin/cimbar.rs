//! Command-line front end for the color-icon matrix barcode codec.

use std::path::PathBuf;
use std::process::ExitCode;

use cimbar_internal::prelude::*;
use clap::{Parser, Subcommand};
use log::{error, info};

#[derive(Parser)]
#[command(name = "cimbar")]
#[command(author, version, about = "Encode/decode the color-icon matrix barcode", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Render a payload to a cimbar page image.
	Encode {
		/// File to read the payload from.
		input: PathBuf,
		/// Where to write the rendered page (PNG, by extension).
		output: PathBuf,
		/// Render on a light background instead of dark.
		#[arg(long)]
		light: bool,
		/// Reed-Solomon parity bytes per 155-byte block (0 disables ECC).
		#[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u8).range(0..=150))]
		ecc: u8,
		/// Wrap the payload in a fountain stream so it can span multiple pages.
		#[arg(long)]
		fountain: bool,
	},
	/// Recover a payload from a cimbar page image.
	Decode {
		/// Page image to read.
		input: PathBuf,
		/// Where to write the recovered payload.
		output: PathBuf,
		/// The page was rendered on a light background instead of dark.
		#[arg(long)]
		light: bool,
		/// Reed-Solomon parity bytes per 155-byte block (0 disables ECC); must match encode.
		#[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u8).range(0..=150))]
		ecc: u8,
		/// The page was encoded with `--fountain`.
		#[arg(long)]
		fountain: bool,
		/// How much localization work to do before classifying cells: 0 = assume already
		/// canonical, 1 = anchor detection and homography, 2 = homography plus dewarp.
		#[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(0..=2))]
		deskew: u8,
		/// Always run the sharpening preprocess, regardless of the deskewed image's size.
		#[arg(long)]
		force_preprocess: bool,
	},
}

fn variant(light: bool) -> PaletteVariant {
	if light { PaletteVariant::Light } else { PaletteVariant::Dark }
}

fn run_encode(input: PathBuf, output: PathBuf, light: bool, ecc: u8, fountain: bool) -> Result<(), CoreError> {
	let payload = std::fs::read(&input)?;
	info!("encoding {} bytes from {}", payload.len(), input.display());
	let image = encode(&payload, variant(light), ecc as usize, fountain)?;
	image.save(&output)?;
	info!("wrote page to {}", output.display());
	Ok(())
}

fn run_decode(
	input: PathBuf,
	output: PathBuf,
	light: bool,
	ecc: u8,
	fountain: bool,
	deskew: u8,
	force_preprocess: bool,
) -> Result<(), CoreError> {
	let image = image::open(&input)?.to_rgb8();
	info!("decoding {}", input.display());
	let payload = decode_with_options(
		&image,
		variant(light),
		ecc as usize,
		fountain,
		DeskewLevel::from_level(deskew),
		force_preprocess,
	)?;
	std::fs::write(&output, &payload)?;
	info!("recovered {} bytes to {}", payload.len(), output.display());
	Ok(())
}

fn main() -> ExitCode {
	env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

	let cli = Cli::parse();
	let result = match cli.command {
		Commands::Encode {
			input,
			output,
			light,
			ecc,
			fountain,
		} => run_encode(input, output, light, ecc, fountain),
		Commands::Decode {
			input,
			output,
			light,
			ecc,
			fountain,
			deskew,
			force_preprocess,
		} => run_decode(input, output, light, ecc, fountain, deskew, force_preprocess),
	};

	if let Err(err) = result {
		error!("{err}");
		return ExitCode::FAILURE;
	}
	ExitCode::SUCCESS
}
