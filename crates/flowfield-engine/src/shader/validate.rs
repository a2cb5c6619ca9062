use std::error::Error as _;

use super::{ShaderError, ShaderStage};

/// Parses and validates a WGSL source without touching the device.
///
/// On failure the returned error carries the full compiler log, including the
/// annotated source span for parse errors.
pub fn validate_wgsl(label: &str, source: &str) -> Result<naga::Module, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| ShaderError::Parse {
        label: label.to_owned(),
        log: e.emit_to_string(source),
    })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );

    validator.validate(&module).map_err(|e| {
        let mut log = e.to_string();
        let mut cause = e.source();
        while let Some(c) = cause {
            log.push_str("\n  caused by: ");
            log.push_str(&c.to_string());
            cause = c.source();
        }
        ShaderError::Validation {
            label: label.to_owned(),
            log,
        }
    })?;

    Ok(module)
}

/// Looks up `entry` for `stage` in a validated module.
pub fn find_entry_point<'m>(
    label: &str,
    module: &'m naga::Module,
    stage: ShaderStage,
    entry: &str,
) -> Result<&'m naga::EntryPoint, ShaderError> {
    let naga_stage = stage.to_naga().ok_or(ShaderError::UnsupportedStage(stage))?;

    module
        .entry_points
        .iter()
        .find(|ep| ep.stage == naga_stage && ep.name == entry)
        .ok_or_else(|| ShaderError::MissingEntryPoint {
            label: label.to_owned(),
            stage,
            entry: entry.to_owned(),
        })
}
