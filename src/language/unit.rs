use clap::ValueEnum;
use serde::Serialize;

/// Display unit for byte totals; each step is a factor of 1024.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteUnit {
    Bytes,
    Kilobytes,
    Megabytes,
    Gigabytes,
}

impl ByteUnit {
    pub fn label(self) -> &'static str {
        match self {
            ByteUnit::Bytes => "bytes",
            ByteUnit::Kilobytes => "kilobytes",
            ByteUnit::Megabytes => "megabytes",
            ByteUnit::Gigabytes => "gigabytes",
        }
    }

    pub fn scale(self, bytes: u64) -> f64 {
        let exponent = match self {
            ByteUnit::Bytes => 0,
            ByteUnit::Kilobytes => 1,
            ByteUnit::Megabytes => 2,
            ByteUnit::Gigabytes => 3,
        };
        bytes as f64 / 1024f64.powi(exponent)
    }

    pub fn format(self, bytes: u64) -> String {
        format!("{:.2}", self.scale(bytes))
    }
}
