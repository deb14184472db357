use crate::core::metadata::{extract_isce_metadata, get_processor};
use crate::core::stack::{prepare_geometry, prepare_stack};
use crate::io::baseline::read_baseline_timeseries;
use crate::io::glob_sorted;
use crate::io::rsc::RscMetadata;
use crate::types::{PrepResult, Processor};
use clap::{ArgGroup, Parser};
use std::path::{Path, PathBuf};

const EXAMPLE: &str = "example:
  # interferogram stack
  prep_isce -i ./merged/interferograms -f filt_*.unw -m ./reference/IW1.xml -b ./baselines -g ./merged/geom_reference
  prep_isce -i ./Igrams -f filt_*.unw -m ./referenceShelve/data.dat -b ./baselines -g ./geom_reference
  # offset stack
  prep_isce -i ./merged/offsets -f filtAz*.off -m ./reference/IW1.xml -b ./baselines -g ./merged/offsets/geom_reference
  # geometry only
  prep_isce -m ./reference/IW1.xml -g ./merged/geom_reference";

/// Prepare ISCE metadata files for time-series analysis
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, after_help = EXAMPLE)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .multiple(true)
        .args(["ifg_dir", "geometry_dir", "meta_file"])
))]
pub struct CliArgs {
    /// Directory with the interferogram sub-directories (`<date1>_<date2>/`)
    #[arg(short = 'i', long = "ifg-dir")]
    pub ifg_dir: Option<PathBuf>,

    /// File name pattern(s) inside each interferogram directory
    #[arg(short = 'f', long = "file-pattern", num_args = 1.., default_value = "filt_*.unw")]
    pub file_patterns: Vec<String>,

    /// Metadata file: reference/IW*.xml (topsStack) or a frame XML (stripmapStack)
    #[arg(short = 'm', long = "meta-file")]
    pub meta_file: Option<PathBuf>,

    /// Directory with the baseline text files
    #[arg(short = 'b', long = "baseline-dir")]
    pub baseline_dir: Option<PathBuf>,

    /// Directory with the geometry files in radar coordinates
    #[arg(short = 'g', long = "geometry-dir")]
    pub geometry_dir: Option<PathBuf>,

    /// Regenerate every .rsc file, even when it is up to date
    #[arg(long)]
    pub force: bool,
}

/// Settings of one `prep_isce` run
#[derive(Debug, Clone)]
pub struct PrepConfig {
    pub ifg_dir: Option<PathBuf>,
    pub file_patterns: Vec<String>,
    pub meta_file: Option<PathBuf>,
    pub baseline_dir: Option<PathBuf>,
    pub geometry_dir: Option<PathBuf>,
    /// Skip outputs that are already up to date
    pub update_mode: bool,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            ifg_dir: None,
            file_patterns: vec!["filt_*.unw".to_string()],
            meta_file: None,
            baseline_dir: None,
            geometry_dir: None,
            update_mode: true,
        }
    }
}

impl From<CliArgs> for PrepConfig {
    fn from(args: CliArgs) -> Self {
        Self {
            ifg_dir: args.ifg_dir,
            file_patterns: args.file_patterns,
            meta_file: args.meta_file,
            baseline_dir: args.baseline_dir,
            geometry_dir: args.geometry_dir,
            update_mode: !args.force,
        }
    }
}

/// Baseline layout without a metadata file: topsStack keeps one
/// sub-directory per pair.
fn infer_processor(baseline_dir: &Path) -> PrepResult<Processor> {
    let processor = if glob_sorted(baseline_dir, "*/*.txt")?.is_empty() {
        Processor::Stripmap
    } else {
        Processor::Tops
    };
    log::warn!(
        "no metadata file given, assume ISCE/{} from the layout of {}",
        processor,
        baseline_dir.display()
    );
    Ok(processor)
}

/// Run the whole preparation: common metadata, geometry `.rsc` files,
/// baselines, then interferogram `.rsc` files.
pub fn run(config: &PrepConfig) -> PrepResult<()> {
    let mut meta = RscMetadata::new();
    let mut processor = None;

    if let Some(meta_file) = &config.meta_file {
        processor = Some(get_processor(meta_file)?);
        meta = extract_isce_metadata(
            meta_file,
            config.geometry_dir.as_deref(),
            None,
            config.update_mode,
        )?;
    }

    if let Some(geom_dir) = &config.geometry_dir {
        meta = prepare_geometry(geom_dir, &meta, config.update_mode)?;
    }

    let mut baselines = None;
    if let Some(baseline_dir) = &config.baseline_dir {
        let processor = match processor {
            Some(p) => p,
            None => infer_processor(baseline_dir)?,
        };
        baselines = read_baseline_timeseries(baseline_dir, processor)?;
    }

    if let Some(ifg_dir) = &config.ifg_dir {
        for pattern in &config.file_patterns {
            let num_file = prepare_stack(
                ifg_dir,
                pattern,
                &meta,
                baselines.as_ref(),
                config.update_mode,
            )?;
            log::debug!("{} files of {}", num_file, pattern);
        }
    }

    log::info!("Done.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["prep_isce", "-g", "geom_reference"]).unwrap();
        let config = PrepConfig::from(args);
        assert_eq!(config.file_patterns, vec!["filt_*.unw".to_string()]);
        assert!(config.update_mode);
        assert_eq!(config.geometry_dir, Some(PathBuf::from("geom_reference")));
        assert!(config.ifg_dir.is_none());
    }

    #[test]
    fn test_multiple_patterns_and_force() {
        let args = CliArgs::try_parse_from([
            "prep_isce",
            "-i",
            "merged/interferograms",
            "-f",
            "filt_*.unw",
            "filt_*.cor",
            "-m",
            "reference/IW1.xml",
            "--force",
        ])
        .unwrap();
        let config = PrepConfig::from(args);
        assert_eq!(config.file_patterns, vec!["filt_*.unw", "filt_*.cor"]);
        assert!(!config.update_mode);
        assert_eq!(config.meta_file, Some(PathBuf::from("reference/IW1.xml")));
    }

    #[test]
    fn test_requires_an_input() {
        assert!(CliArgs::try_parse_from(["prep_isce"]).is_err());
        assert!(CliArgs::try_parse_from(["prep_isce", "-b", "baselines"]).is_err());
    }

    #[test]
    fn test_infer_processor_from_baseline_layout() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("20120507_20120622.txt"), "").unwrap();
        assert_eq!(infer_processor(dir.path()).unwrap(), Processor::Stripmap);

        let pair = dir.path().join("20120507_20120807");
        std::fs::create_dir(&pair).unwrap();
        std::fs::write(pair.join("20120507_20120807.txt"), "").unwrap();
        assert_eq!(infer_processor(dir.path()).unwrap(), Processor::Tops);
    }
}
