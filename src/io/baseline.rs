use crate::io::glob_sorted;
use crate::io::rsc::read_template;
use crate::types::{PrepError, PrepResult, Processor};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// Perpendicular baseline [top, bottom] in meters, per acquisition date
/// (`YYYYMMDD`), relative to the reference date
pub type BaselineTimeseries = BTreeMap<String, [f64; 2]>;

/// Mean of every `Bperp (average): <value>` line of a topsStack
/// baseline file. Top and bottom are the same value.
pub fn read_tops_baseline<P: AsRef<Path>>(path: P) -> PrepResult<[f64; 2]> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    let mut bperps = Vec::new();
    for line in content.lines() {
        let mut parts = line.split(':');
        if parts.next() != Some("Bperp (average)") {
            continue;
        }
        let value = parts.next().unwrap_or("").trim();
        let bperp = value.parse::<f64>().map_err(|e| {
            PrepError::InvalidFormat(format!(
                "Invalid Bperp '{}' in {}: {}",
                value,
                path.display(),
                e
            ))
        })?;
        bperps.push(bperp);
    }

    if bperps.is_empty() {
        return Err(PrepError::Metadata(format!(
            "No 'Bperp (average)' entry in {}",
            path.display()
        )));
    }
    let mean = bperps.iter().sum::<f64>() / bperps.len() as f64;
    Ok([mean, mean])
}

/// `PERP_BASELINE_TOP` / `PERP_BASELINE_BOTTOM` of a stripmapStack
/// baseline file
pub fn read_stripmap_baseline<P: AsRef<Path>>(path: P) -> PrepResult<[f64; 2]> {
    let path = path.as_ref();
    let template = read_template(path, ' ')?;
    let top = template
        .get_f64("PERP_BASELINE_TOP")
        .map_err(|e| PrepError::Metadata(format!("{}: {}", path.display(), e)))?;
    let bottom = template
        .get_f64("PERP_BASELINE_BOTTOM")
        .map_err(|e| PrepError::Metadata(format!("{}: {}", path.display(), e)))?;
    Ok([top, bottom])
}

/// Most frequent item; ties go to the first one in iteration order
fn most_common<'a, I: IntoIterator<Item = &'a str>>(items: I) -> Option<&'a str> {
    let mut order = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for item in items {
        let count = counts.entry(item).or_insert(0);
        if *count == 0 {
            order.push(item);
        }
        *count += 1;
    }
    // max_by_key keeps the last maximum, so walk the order in reverse
    order.into_iter().rev().max_by_key(|item| counts[item])
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

/// Read the perpendicular baseline time-series from a `baselines`
/// directory.
///
/// topsStack writes `<dir>/<date1>_<date2>/<date1>_<date2>.txt`,
/// stripmapStack `<dir>/<date1>_<date2>.txt`. Files whose reference
/// date differs from the most common one (left over from a run with a
/// different reference) are ignored. Returns `None` when no baseline
/// file exists.
pub fn read_baseline_timeseries<P: AsRef<Path>>(
    baseline_dir: P,
    processor: Processor,
) -> PrepResult<Option<BaselineTimeseries>> {
    let baseline_dir = baseline_dir.as_ref();
    log::info!(
        "read perp baseline time-series from {}",
        baseline_dir.display()
    );

    let files = match processor {
        Processor::Tops => glob_sorted(baseline_dir, "*/*.txt")?,
        Processor::Stripmap => glob_sorted(baseline_dir, "*.txt")?,
    };
    if files.is_empty() {
        let abs = fs::canonicalize(baseline_dir).unwrap_or_else(|_| baseline_dir.to_path_buf());
        log::warn!("no baseline text file found in dir {}", abs.display());
        return Ok(None);
    }

    let reference = most_common(files.iter().map(|f| {
        file_name(f).split('_').next().unwrap_or("")
    }))
    .unwrap_or("")
    .to_string();

    let mut timeseries = BaselineTimeseries::new();
    for file in &files {
        let name = file_name(file);
        let stem = name.strip_suffix(".txt").unwrap_or(name);
        let dates: Vec<&str> = stem.split('_').collect();
        if dates[0] != reference {
            log::debug!("ignore {} with reference date {}", name, dates[0]);
            continue;
        }
        let secondary = dates.get(1).ok_or_else(|| {
            PrepError::InvalidFormat(format!(
                "Baseline file name without a date pair: {}",
                file.display()
            ))
        })?;

        let bperp = match processor {
            Processor::Tops => read_tops_baseline(file)?,
            Processor::Stripmap => read_stripmap_baseline(file)?,
        };
        log::debug!("{} -> {}: {:?}", reference, secondary, bperp);
        timeseries.insert(secondary.to_string(), bperp);
    }
    timeseries.insert(reference, [0.0, 0.0]);

    Ok(Some(timeseries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_most_common() {
        assert_eq!(most_common(["a", "b", "a"]), Some("a"));
        assert_eq!(most_common(["b", "a"]), Some("b"));
        assert_eq!(most_common(Vec::<&str>::new()), None);
    }

    #[test]
    fn test_tops_baseline_mean() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("20170102_20170114.txt");
        fs::write(
            &path,
            "swath: IW1\nBperp (average): 10.0\nBpar (average): 3.0\n\
             swath: IW2\nBperp (average): 14.0\n",
        )
        .unwrap();
        assert_eq!(read_tops_baseline(&path).unwrap(), [12.0, 12.0]);
    }

    #[test]
    fn test_stripmap_timeseries_ignores_stale_reference() {
        let dir = TempDir::new().unwrap();
        for (name, top, bottom) in [
            ("20120507_20120622.txt", 100.0, 110.0),
            ("20120507_20120807.txt", -50.0, -45.0),
            ("20120622_20120807.txt", 999.0, 999.0),
        ] {
            fs::write(
                dir.path().join(name),
                format!("PERP_BASELINE_TOP {}\nPERP_BASELINE_BOTTOM {}\n", top, bottom),
            )
            .unwrap();
        }

        let ts = read_baseline_timeseries(dir.path(), Processor::Stripmap)
            .unwrap()
            .unwrap();
        assert_eq!(ts.len(), 3);
        assert_eq!(ts["20120507"], [0.0, 0.0]);
        assert_eq!(ts["20120622"], [100.0, 110.0]);
        assert_eq!(ts["20120807"], [-50.0, -45.0]);
    }

    #[test]
    fn test_empty_dir_gives_none() {
        let dir = TempDir::new().unwrap();
        assert!(read_baseline_timeseries(dir.path(), Processor::Tops)
            .unwrap()
            .is_none());
    }
}
