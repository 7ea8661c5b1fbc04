// Human-readable performance log writer
use crate::domain::metrics::MetricsResult;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

const RULE: &str = "=================";

/// Writes the scalar metrics report. Sections are written in call order.
pub struct MetricsLog<W: Write> {
    out: W,
    sections: usize,
}

impl MetricsLog<BufWriter<File>> {
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> MetricsLog<W> {
    pub fn new(out: W) -> Self {
        Self { out, sections: 0 }
    }

    pub fn header(&mut self, n_points: usize) -> io::Result<()> {
        writeln!(self.out, "{}", RULE)?;
        writeln!(self.out, "===PERFORMANCE===")?;
        writeln!(self.out, "{}", RULE)?;
        writeln!(self.out, "N_points: {}", n_points)?;
        writeln!(self.out)
    }

    pub fn variant(&mut self, label: &str, metrics: &MetricsResult) -> io::Result<()> {
        if self.sections > 0 {
            writeln!(self.out)?;
        }
        self.sections += 1;
        writeln!(self.out, "{}", label)?;
        writeln!(self.out, "{}", RULE)?;
        for (key, value) in metrics.iter() {
            writeln!(self.out, "{}: {:.5}", key, value)?;
        }
        Ok(())
    }

    pub fn percent_better(&mut self, first: &str, second: &str, percent: f64) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(
            self.out,
            "Percent Better: {} method is better than {} method {:.3}% of the time",
            first, second, percent
        )
    }

    pub fn source(&mut self, path: &Path) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "Source file: {}", path.display())
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::{BIAS, MSE};

    #[test]
    fn test_report_layout() {
        let mut metrics = MetricsResult::new();
        metrics.insert(MSE, 12.345678);
        metrics.insert(BIAS, -1.5);

        let mut log = MetricsLog::new(Vec::new());
        log.header(3).unwrap();
        log.variant("Biot-Savart", &metrics).unwrap();
        log.variant("DPS", &metrics).unwrap();
        log.percent_better("Biot-Savart", "DPS", 66.66666).unwrap();
        log.source(Path::new("log_n000000.log")).unwrap();
        let text = String::from_utf8(log.finish().unwrap()).unwrap();

        let expected = "\
=================
===PERFORMANCE===
=================
N_points: 3

Biot-Savart
=================
MSE: 12.34568
bias: -1.50000

DPS
=================
MSE: 12.34568
bias: -1.50000

Percent Better: Biot-Savart method is better than DPS method 66.667% of the time

Source file: log_n000000.log
";
        assert_eq!(text, expected);
    }
}
