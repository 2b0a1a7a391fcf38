use crate::compose::Composition;
use crate::config::OutputConfig;
use crate::error::Result;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Pretty JSON the way it is written to disk: 2-space indent, non-ASCII kept as-is.
pub fn render_json(composition: &Composition) -> Result<String> {
    Ok(serde_json::to_string_pretty(&composition.to_value())?)
}

/// File a composition is written to
pub fn output_path(composition: &Composition, output: &OutputConfig) -> PathBuf {
    if composition.is_merged() {
        output.merged_path()
    } else {
        output.generated_path()
    }
}

/// Write the composition, replacing any earlier file of the same name.
pub fn persist(composition: &Composition, output: &OutputConfig) -> Result<PathBuf> {
    let path = output_path(composition, output);
    let json = render_json(composition)?;

    if !output.dir.as_os_str().is_empty() {
        fs::create_dir_all(&output.dir)?;
    }
    fs::write(&path, json)?;

    info!("Wrote {}", path.display());
    Ok(path)
}
