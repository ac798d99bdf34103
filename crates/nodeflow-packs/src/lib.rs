pub mod manifest;

use std::path::Path;

use tracing::{debug, info, warn};

use nodeflow_core::types::OpKind;
use nodeflow_ops::{OpLibrary, OpRegistry};

use manifest::PackFile;

/// Walk a nodepack root and build the operation registry.
///
/// Each subdirectory is one nodepack; the three structural file names
/// `ops.toml`, `progress_ops.toml` and `stream_ops.toml` carry plain,
/// progress and stream units. A unit that cannot be resolved (unknown
/// type tag, missing literal values, unbound `impl`, duplicate name) is
/// skipped with a diagnostic; discovery itself never fails.
pub fn load_nodepacks(dir: &Path, library: &OpLibrary) -> OpRegistry {
    let mut registry = OpRegistry::new();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "Cannot read nodepacks directory");
            return registry;
        }
    };

    // Deterministic discovery order: packs sorted by name.
    let mut packs: Vec<_> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    packs.sort();

    for pack in packs {
        load_pack_file(&pack.join("ops.toml"), OpKind::Plain, library, &mut registry);
        load_pack_file(
            &pack.join("progress_ops.toml"),
            OpKind::Progress,
            library,
            &mut registry,
        );
        load_pack_file(
            &pack.join("stream_ops.toml"),
            OpKind::Stream,
            library,
            &mut registry,
        );
    }

    info!(path = %dir.display(), ops = registry.len(), "Nodepacks loaded");
    registry
}

fn load_pack_file(path: &Path, kind: OpKind, library: &OpLibrary, registry: &mut OpRegistry) {
    if !path.exists() {
        return;
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read nodepack manifest");
            return;
        }
    };

    let file: PackFile = match toml::from_str(&content) {
        Ok(file) => file,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to parse nodepack manifest");
            return;
        }
    };

    for unit in &file.ops {
        // Private units are not exported.
        if unit.name.starts_with('_') {
            debug!(unit = %unit.name, "Skipping private unit");
            continue;
        }

        let schema = match unit.to_schema(kind, path) {
            Ok(schema) => schema,
            Err(e) => {
                warn!(path = %path.display(), unit = %unit.name, error = %e, "Skipping unit");
                continue;
            }
        };

        let registered = match kind {
            OpKind::Plain => match library.plain(unit.binding()) {
                Some(op) => registry.register_plain(schema, op),
                None => {
                    warn!(unit = %unit.name, binding = %unit.binding(), "No plain callable for binding");
                    continue;
                }
            },
            OpKind::Progress => match library.progress(unit.binding()) {
                Some(op) => registry.register_progress(schema, op),
                None => {
                    warn!(unit = %unit.name, binding = %unit.binding(), "No progress callable for binding");
                    continue;
                }
            },
            OpKind::Stream => match library.stream(unit.binding()) {
                Some(op) => registry.register_stream(schema, op),
                None => {
                    warn!(unit = %unit.name, binding = %unit.binding(), "No stream callable for binding");
                    continue;
                }
            },
        };

        if registered {
            debug!(unit = %unit.name, path = %path.display(), "Registered operation");
        } else {
            warn!(unit = %unit.name, path = %path.display(), "Duplicate operation name, skipping");
        }
    }
}
