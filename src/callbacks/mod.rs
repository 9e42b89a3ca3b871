use std::{
    fs::{create_dir_all, File},
    io::{BufWriter, Write as _},
    path::Path,
};

use anyhow::Context as _;
use serde::Serialize;

pub mod log_plan;

pub fn dump_json<T>(path: impl AsRef<Path>, value: &T) -> anyhow::Result<()>
where
    T: ?Sized + Serialize,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let file = File::create(path).with_context(|| format!("unable to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

#[test]
fn test_dump_json_creates_parent_dirs() {
    let dir = std::env::temp_dir().join(format!("dump_json_{}", std::process::id()));
    let path = dir.join("nested").join("value.json");
    dump_json(&path, &serde_json::json!({ "miles": 1250 })).unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["miles"], 1250);
    std::fs::remove_dir_all(dir).ok();
}
