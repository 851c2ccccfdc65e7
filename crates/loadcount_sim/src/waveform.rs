//! Waveform recording for simulation output.
//!
//! The [`WaveformRecorder`] trait abstracts waveform output. [`VcdRecorder`]
//! writes the IEEE 1364 Value Change Dump format, which GTKWave and Surfer
//! open directly.

use std::io::Write;

use loadcount_common::{Logic, LogicVec};

use crate::error::SimError;
use crate::value::SimSignalId;

/// Trait for recording simulation waveforms.
pub trait WaveformRecorder {
    /// Declares a signal in the current scope.
    fn register_signal(&mut self, id: SimSignalId, name: &str, width: u32) -> Result<(), SimError>;

    /// Opens a new scope (hierarchy level).
    fn begin_scope(&mut self, name: &str) -> Result<(), SimError>;

    /// Closes the current scope.
    fn end_scope(&mut self) -> Result<(), SimError>;

    /// Records the value of a signal at the given time (in femtoseconds).
    ///
    /// Times must be non-decreasing across calls. Recording a value equal to
    /// the last one recorded for the signal is allowed and produces no output.
    fn record_change(
        &mut self,
        time_fs: u64,
        id: SimSignalId,
        value: &LogicVec,
    ) -> Result<(), SimError>;

    /// Flushes the output.
    fn finalize(&mut self) -> Result<(), SimError>;
}

/// A declared VCD variable.
struct VcdVar {
    id: SimSignalId,
    code: String,
    width: u32,
    last: Option<LogicVec>,
}

/// VCD recorder following IEEE 1364, with a 1 fs timescale.
///
/// Identifier codes are printable ASCII starting from `!` (0x21).
pub struct VcdRecorder<W: Write> {
    writer: W,
    vars: Vec<VcdVar>,
    header_written: bool,
    definitions_closed: bool,
    current_time: Option<u64>,
}

impl<W: Write> VcdRecorder<W> {
    /// Creates a new VCD recorder writing to the given output.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            vars: Vec::new(),
            header_written: false,
            definitions_closed: false,
            current_time: None,
        }
    }

    /// Consumes the recorder and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn ensure_header(&mut self) -> Result<(), SimError> {
        if self.header_written {
            return Ok(());
        }
        writeln!(self.writer, "$version")?;
        writeln!(self.writer, "  loadcount behavioral model")?;
        writeln!(self.writer, "$end")?;
        writeln!(self.writer, "$timescale")?;
        writeln!(self.writer, "  1fs")?;
        writeln!(self.writer, "$end")?;
        self.header_written = true;
        Ok(())
    }

    fn close_definitions(&mut self) -> Result<(), SimError> {
        if !self.definitions_closed {
            self.ensure_header()?;
            writeln!(self.writer, "$enddefinitions $end")?;
            self.definitions_closed = true;
        }
        Ok(())
    }

    /// Generates a VCD identifier code; indices of 94 and up use several characters.
    fn make_id_code(index: usize) -> String {
        let mut code = String::new();
        let mut idx = index;
        loop {
            code.push(char::from(b'!' + (idx % 94) as u8));
            idx /= 94;
            if idx == 0 {
                break;
            }
            idx -= 1;
        }
        code
    }

    fn logic_char(bit: Logic) -> char {
        match bit {
            Logic::Zero => '0',
            Logic::One => '1',
            Logic::X => 'x',
            Logic::Z => 'z',
        }
    }

    /// Formats a value change line body: `1!` for scalars, `b1010 !` for vectors.
    fn format_change(value: &LogicVec, width: u32, code: &str) -> String {
        if width == 1 {
            format!("{}{code}", Self::logic_char(value.get(0)))
        } else {
            let bits: String = (0..width)
                .rev()
                .map(|i| {
                    if i < value.width() {
                        Self::logic_char(value.get(i))
                    } else {
                        'x'
                    }
                })
                .collect();
            format!("b{bits} {code}")
        }
    }
}

impl<W: Write> WaveformRecorder for VcdRecorder<W> {
    fn register_signal(&mut self, id: SimSignalId, name: &str, width: u32) -> Result<(), SimError> {
        self.ensure_header()?;
        let code = Self::make_id_code(self.vars.len());
        writeln!(self.writer, "$var wire {width} {code} {name} $end")?;
        self.vars.push(VcdVar {
            id,
            code,
            width,
            last: None,
        });
        Ok(())
    }

    fn begin_scope(&mut self, name: &str) -> Result<(), SimError> {
        self.ensure_header()?;
        writeln!(self.writer, "$scope module {name} $end")?;
        Ok(())
    }

    fn end_scope(&mut self) -> Result<(), SimError> {
        writeln!(self.writer, "$upscope $end")?;
        Ok(())
    }

    fn record_change(
        &mut self,
        time_fs: u64,
        id: SimSignalId,
        value: &LogicVec,
    ) -> Result<(), SimError> {
        let index = self
            .vars
            .iter()
            .position(|v| v.id == id)
            .ok_or(SimError::UnregisteredSignal(id.as_raw()))?;
        if self.vars[index].last.as_ref() == Some(value) {
            return Ok(());
        }

        self.close_definitions()?;
        if self.current_time != Some(time_fs) {
            writeln!(self.writer, "#{time_fs}")?;
            self.current_time = Some(time_fs);
        }

        let var = &mut self.vars[index];
        let line = Self::format_change(value, var.width, &var.code);
        var.last = Some(value.clone());
        writeln!(self.writer, "{line}")?;
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), SimError> {
        self.close_definitions()?;
        self.writer.flush()?;
        Ok(())
    }
}
