use std::fs;
use std::path::{Path, PathBuf};

/// Minutes of synthetic storm data in the shared fixtures.
pub const N_MINUTES: usize = 30;

fn observed(i: usize) -> f64 {
    -(i as f64) * 3.0
}

/// Simulation log with calendar time columns and both index variants.
pub fn write_sim_log(dir: &Path) -> PathBuf {
    let mut text = String::from("RAM-SCB synthetic run\n");
    text.push_str("t year mo dy hr mn sc msc dstRam dstBiot\n");
    for i in 0..N_MINUTES {
        let obs = observed(i);
        text.push_str(&format!(
            "{:.1} 2005 1 1 0 {} 0 0 {:.3} {:.3}\n",
            (i * 60) as f64,
            i,
            obs + 2.0,
            obs * 0.8 - 1.0
        ));
    }
    let path = dir.join("log_n000000.log");
    fs::write(&path, text).unwrap();
    path
}

/// Reference file in JSON-headed ASCII with `extra` more minutes than the log.
pub fn write_reference(dir: &Path, extra: usize) -> PathBuf {
    let mut text = String::from(
        "#{\"time\": {\"DIMENSION\": [1], \"START_COLUMN\": 0},\n\
         # \"sym-h\": {\"DIMENSION\": [1], \"START_COLUMN\": 1, \"Units\": \"nT\"}}\n",
    );
    for i in 0..N_MINUTES + extra {
        text.push_str(&format!("2005-01-01T00:{:02}:00 {}\n", i, observed(i)));
    }
    let path = dir.join("kyotodata_Jan2005.txt");
    fs::write(&path, text).unwrap();
    path
}

pub fn data_lines(path: &Path) -> usize {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|line| !line.trim_start().starts_with('#') && !line.trim().is_empty())
        .count()
}
