//! Annotates data-import-cron template files with the CPU architectures
//! their container disk images are published for.
//!
//! For every template the effective image URL is resolved (explicit registry
//! URL or image-stream lookup), the registry manifest is fetched, and
//! multi-architecture images get the supported-architectures annotation
//! stamped on the template metadata. Results go to stdout, a single output
//! file, or back into the input files with `-i`.

mod cleanup;
mod dicts;
mod imagestream;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use registry_client::RegistryClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Annotate DataImportCronTemplate files with supported architectures")]
struct Cli {
    /// Directory containing image stream files
    #[arg(long, env = "IMAGE_STREAM_DIR")]
    image_stream_dir: Option<PathBuf>,

    /// Directory containing DataImportCronTemplate files (required)
    #[arg(long, env = "DICT_DIR")]
    dict_dir: PathBuf,

    /// Path to output file. Can't be used with the -i flag
    #[arg(long, conflicts_with = "in_place")]
    output: Option<PathBuf>,

    /// Update the DataImportCronTemplate files in place with the updated
    /// architectures. Can't be used with the --output flag
    #[arg(short = 'i', long = "in-place")]
    in_place: bool,

    /// Timeout for the whole batch, in seconds
    #[arg(long, default_value_t = 300)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let registry = RegistryClient::new()?;

    tokio::time::timeout(Duration::from_secs(cli.timeout), run(&cli, &registry))
        .await
        .context("timed out annotating the DataImportCronTemplate files")?
}

async fn run(cli: &Cli, registry: &dyn registry_client::RegistryClientTrait) -> anyhow::Result<()> {
    info!("Start annotating the DataImportCronTemplate files");

    let is_map = match &cli.image_stream_dir {
        Some(dir) => {
            info!("Reading the imageStream files");
            imagestream::build_image_stream_map(dir)?
        }
        None => Default::default(),
    };

    let mut output = match &cli.output {
        Some(path) => Some(
            fs::File::create(path)
                .with_context(|| format!("error creating file {}", path.display()))?,
        ),
        None => None,
    };

    for filename in yaml_files(&cli.dict_dir)? {
        let mut templates = dicts::read_templates(&filename)?;
        let changed = dicts::annotate(&mut templates, registry, &is_map).await?;

        if !changed {
            info!("no changes for {}", filename.display());
            continue;
        }

        let rendered = dicts::render(&templates)?;
        write_result(&rendered, &filename, cli.in_place, output.as_mut())?;
    }

    Ok(())
}

/// The regular `.yaml`/`.yml` files of `dir`, sorted so output is stable.
fn yaml_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("error reading the DataImportCronTemplate directory {}", dir.display()))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("yaml") | Some("yml")
                )
        })
        .collect();
    files.sort();
    Ok(files)
}

fn write_result(
    rendered: &str,
    filename: &Path,
    in_place: bool,
    output: Option<&mut fs::File>,
) -> anyhow::Result<()> {
    if in_place {
        info!("Updating the DataImportCronTemplate file {} with the changes", filename.display());
        fs::write(filename, rendered)
            .with_context(|| format!("error writing the result {}", filename.display()))?;
        return Ok(());
    }

    match output {
        Some(file) => {
            info!("Writing the updated DataImportCronTemplates to the output file");
            file.write_all(rendered.as_bytes())
                .with_context(|| format!("error writing the result {}", filename.display()))?;
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_files_are_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.yaml"), "").unwrap();
        fs::write(dir.path().join("a.yml"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let files = yaml_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.yml", "b.yaml"]);
    }
}
