//! Plan document reading and writing.

use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use bcut_models::{Plan, PLAN_SCHEMA_VERSION};

use crate::binder::{bind_images, list_images};
use crate::error::{MediaError, MediaResult};

/// Write a plan document as pretty-printed JSON.
pub fn write_plan(plan: &Plan, path: impl AsRef<Path>) -> MediaResult<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(plan)?;
    std::fs::write(path, json)?;
    info!(plan = %path.display(), "wrote plan document");
    Ok(())
}

/// Read a plan document, verifying the schema version before the full
/// deserialization so a version mismatch is reported as such rather than as
/// an arbitrary missing-field error.
pub fn read_plan(path: impl AsRef<Path>) -> MediaResult<Plan> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text)?;

    let version = value
        .get("schema_version")
        .and_then(Value::as_u64)
        .ok_or_else(|| MediaError::PlanFieldMissing("schema_version".to_string()))?
        as u32;
    if version != PLAN_SCHEMA_VERSION {
        return Err(MediaError::PlanSchemaMismatch {
            found: version,
            supported: PLAN_SCHEMA_VERSION,
        });
    }

    serde_json::from_value(value).map_err(|e| {
        let msg = e.to_string();
        match msg
            .strip_prefix("missing field `")
            .and_then(|m| m.split('`').next())
        {
            Some(field) => MediaError::PlanFieldMissing(field.to_string()),
            None => MediaError::Json(e),
        }
    })
}

/// Read a plan and re-bind its images against `images_dir` when any of the
/// recorded paths has gone missing. The segment count is preserved so the
/// cuts and durations stay valid.
pub fn read_plan_with_rebind(path: impl AsRef<Path>, images_dir: &Path) -> MediaResult<Plan> {
    let mut plan = read_plan(path)?;
    if plan.images.iter().all(|p| p.exists()) {
        return Ok(plan);
    }
    warn!(
        dir = %images_dir.display(),
        "plan references missing images, re-binding from image directory"
    );
    let available = list_images(images_dir)?;
    let binding = bind_images(&available, plan.images.len(), &plan.params.images);
    if binding.segment_count < plan.images.len() {
        warn!(
            recorded = plan.images.len(),
            available = binding.segment_count,
            "fewer images available than the plan recorded"
        );
    }
    plan.images = binding.images;
    Ok(plan)
}
