//! Configuration types deserialized from `loadcount.toml`.

use loadcount_common::Frequency;
use loadcount_sim::time::parse_duration;
use loadcount_sim::Clock;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

/// The top-level project configuration parsed from `loadcount.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Core project metadata.
    pub project: ProjectMeta,
    /// Clock generator settings.
    #[serde(default)]
    pub clock: ClockConfig,
    /// Reset sequencing.
    #[serde(default)]
    pub reset: ResetConfig,
    /// Testbench stimulus and output settings.
    #[serde(default)]
    pub test: TestConfig,
}

impl Default for ProjectConfig {
    /// The configuration used when no `loadcount.toml` is present.
    fn default() -> Self {
        Self {
            project: ProjectMeta {
                name: "loadcount".to_string(),
                version: default_version(),
                description: String::new(),
            },
            clock: ClockConfig::default(),
            reset: ResetConfig::default(),
            test: TestConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Resolves the textual settings into the typed values the testbench uses.
    pub fn bench_settings(&self) -> Result<BenchSettings, ConfigError> {
        let frequency: Frequency = self
            .clock
            .frequency
            .parse()
            .map_err(|e| ConfigError::invalid("clock.frequency", e))?;
        let clock = Clock::from_frequency(frequency)
            .map_err(|e| ConfigError::invalid("clock.frequency", e))?;

        if self.reset.cycles == 0 {
            return Err(ConfigError::invalid("reset.cycles", "must be at least 1"));
        }

        let settle_fs =
            parse_duration(&self.test.settle).map_err(|e| ConfigError::invalid("test.settle", e))?;
        if settle_fs == 0 {
            return Err(ConfigError::invalid("test.settle", "must be non-zero"));
        }
        if settle_fs >= clock.period_fs() / 2 {
            return Err(ConfigError::invalid(
                "test.settle",
                format!("must be shorter than half the clock period ({})", self.clock.frequency),
            ));
        }

        Ok(BenchSettings {
            clock_period_fs: clock.period_fs(),
            reset_cycles: self.reset.cycles,
            settle_fs,
            load_value: self.test.load_value,
            release_value: self.test.release_value,
            poll_edges: self.test.poll_edges,
            record_waveform: self.test.waveform,
        })
    }
}

/// Core project metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// The project version string.
    #[serde(default = "default_version")]
    pub version: String,
    /// A brief description of the project.
    #[serde(default)]
    pub description: String,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// Clock generator settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ClockConfig {
    /// The clock frequency as a string (e.g., "100KHz"), parsed to [`Frequency`].
    #[serde(default = "default_frequency")]
    pub frequency: String,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            frequency: default_frequency(),
        }
    }
}

fn default_frequency() -> String {
    "100KHz".to_string()
}

/// Reset sequencing settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ResetConfig {
    /// Rising edges to hold `rst_n` low for.
    #[serde(default = "default_reset_cycles")]
    pub cycles: u32,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            cycles: default_reset_cycles(),
        }
    }
}

fn default_reset_cycles() -> u32 {
    5
}

/// Testbench settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TestConfig {
    /// Settling delay applied after edges before sampling (e.g. "1ns").
    #[serde(default = "default_settle")]
    pub settle: String,
    /// Value driven onto the bus and loaded into the counter.
    #[serde(default = "default_load_value", deserialize_with = "deserialize_byte")]
    pub load_value: u8,
    /// Value driven onto the bus once the core has released it.
    #[serde(default = "default_release_value", deserialize_with = "deserialize_byte")]
    pub release_value: u8,
    /// Edges to wait for the post-load increment before failing.
    #[serde(default = "default_poll_edges")]
    pub poll_edges: u32,
    /// Whether `loadcount test` records a waveform per scenario.
    #[serde(default = "default_true")]
    pub waveform: bool,
    /// The waveform output format.
    #[serde(default)]
    pub waveform_format: WaveformFormat,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            settle: default_settle(),
            load_value: default_load_value(),
            release_value: default_release_value(),
            poll_edges: default_poll_edges(),
            waveform: true,
            waveform_format: WaveformFormat::default(),
        }
    }
}

fn default_settle() -> String {
    "1ns".to_string()
}

fn default_load_value() -> u8 {
    0xA5
}

fn default_release_value() -> u8 {
    0x3C
}

fn default_poll_edges() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

/// Deserializes a byte given either as a TOML integer or as a string with an
/// optional `0x`/`0b` prefix and `_` separators.
fn deserialize_byte<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    struct ByteVisitor;

    impl Visitor<'_> for ByteVisitor {
        type Value = u8;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("an integer in 0..=255 or a string such as \"0xA5\"")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            u8::try_from(v).map_err(|_| E::custom(format!("{v} does not fit in 8 bits")))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            u8::try_from(v).map_err(|_| E::custom(format!("{v} does not fit in 8 bits")))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            parse_byte(v).ok_or_else(|| E::custom(format!("invalid byte literal '{v}'")))
        }
    }

    deserializer.deserialize_any(ByteVisitor)
}

fn parse_byte(s: &str) -> Option<u8> {
    let cleaned: String = s.trim().chars().filter(|&c| c != '_').collect();
    let lower = cleaned.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        u8::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        u8::from_str_radix(bin, 2).ok()
    } else {
        lower.parse().ok()
    }
}

/// Waveform output format for simulation dumps.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WaveformFormat {
    /// Value Change Dump (IEEE 1364).
    #[default]
    Vcd,
}

impl WaveformFormat {
    /// File extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            WaveformFormat::Vcd => "vcd",
        }
    }
}

/// Resolved testbench parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BenchSettings {
    /// Clock period in femtoseconds.
    pub clock_period_fs: u64,
    /// Rising edges with reset held.
    pub reset_cycles: u32,
    /// Settling delay in femtoseconds.
    pub settle_fs: u64,
    /// Value loaded through the bus.
    pub load_value: u8,
    /// Value driven onto the released bus.
    pub release_value: u8,
    /// Edges allowed for the post-load increment to appear.
    pub poll_edges: u32,
    /// Whether to record waveforms.
    pub record_waveform: bool,
}

impl Default for BenchSettings {
    /// A 100 kHz clock, five reset cycles, a 1 ns settle, load `0xA5`,
    /// release `0x3C` and a three-edge poll.
    fn default() -> Self {
        Self {
            clock_period_fs: loadcount_sim::DEFAULT_CLOCK_PERIOD_FS,
            reset_cycles: default_reset_cycles(),
            settle_fs: loadcount_sim::time::FS_PER_NS,
            load_value: default_load_value(),
            release_value: default_release_value(),
            poll_edges: default_poll_edges(),
            record_waveform: true,
        }
    }
}
