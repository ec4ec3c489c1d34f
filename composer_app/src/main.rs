//! Batch scene builder
//!
//! Reads a build manifest, places every enabled slot's asset group with
//! pivot compensation, optionally verifies anchors, and writes the composed
//! scene document. Individual missing assets degrade to warnings; only a
//! corrupt manifest or an unwritable output fails the build.
//!
//! Usage:
//!   compose_scene <manifest.ron> [--output <scene.ron>] [--verify] [--debug]

mod document;
mod manifest;

use std::path::PathBuf;

use scene_composer::foundation::logging;
use scene_composer::prelude::*;

use document::SceneDocument;
use manifest::Manifest;

struct Args {
    manifest: PathBuf,
    output: Option<PathBuf>,
    verify: bool,
    debug: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut manifest = None;
    let mut output = None;
    let mut verify = false;
    let mut debug = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--output" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--output requires a path".to_owned())?;
                output = Some(PathBuf::from(value));
            }
            "--verify" => verify = true,
            "--debug" => debug = true,
            other if other.starts_with("--") => {
                return Err(format!("unknown option '{other}'"));
            }
            other => {
                if manifest.replace(PathBuf::from(other)).is_some() {
                    return Err("more than one manifest path given".to_owned());
                }
            }
        }
    }

    Ok(Args {
        manifest: manifest.ok_or_else(|| "missing manifest path".to_owned())?,
        output,
        verify,
        debug,
    })
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let manifest = Manifest::load_from_file(&args.manifest)?;
    log::info!(
        "building scene from {} ({} slots)",
        args.manifest.display(),
        manifest.slots.len()
    );

    let mut scene = Scene::new();
    let root = scene.add_node(SceneNode::marker(manifest.root_name.as_str()), None);

    let mut loader = AssetLibraryLoader::new();
    let mut composer = PlacementComposer::new();
    let mut placements: Vec<(String, InstancerHandle, Option<String>)> = Vec::new();

    for (slot, config) in &manifest.slots {
        if !config.enabled {
            log::info!("slot '{slot}': disabled");
            continue;
        }
        let resolved = config.resolve(slot, &manifest.defaults);

        let group = match loader.load_group(
            &resolved.library,
            resolved.group.as_deref(),
            resolved.mode,
            &resolved.fallbacks,
        ) {
            Ok(group) => Some(group),
            Err(err) => {
                log::warn!("slot '{slot}': {err}");
                None
            }
        };

        if let Some(instancer) =
            composer.place(&mut scene, group.as_ref(), root, slot, &resolved.spec)
        {
            placements.push((slot.clone(), instancer, resolved.anchor_object));
        }
    }

    if args.verify {
        for (slot, instancer, anchor) in &placements {
            let Some(anchor) = anchor else {
                continue;
            };
            match verify_anchor(&scene, *instancer, anchor) {
                Ok(report) => log::info!(
                    "slot '{slot}': anchor '{anchor}' delta ({:.3}, {:.3}, {:.3})",
                    report.delta.x,
                    report.delta.y,
                    report.delta.z
                ),
                Err(err) => log::warn!("slot '{slot}': anchor verification failed: {err}"),
            }
        }
    }

    let out_path = args
        .output
        .clone()
        .unwrap_or_else(|| manifest.output.scene_path.clone());
    SceneDocument::from_scene(&scene).write(&out_path)?;
    log::info!("wrote scene: {}", out_path.display());
    Ok(())
}

fn main() {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("error: {message}");
            eprintln!(
                "usage: compose_scene <manifest.ron> [--output <scene.ron>] [--verify] [--debug]"
            );
            std::process::exit(2);
        }
    };

    logging::init_with_debug(args.debug);

    if let Err(err) = run(&args) {
        log::error!("build failed: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, String> {
        parse_args(list.iter().map(|s| (*s).to_owned()))
    }

    #[test]
    fn parses_manifest_and_flags() {
        let parsed = args(&["build.ron", "--verify", "--output", "out.ron"]).unwrap();
        assert_eq!(parsed.manifest, PathBuf::from("build.ron"));
        assert_eq!(parsed.output, Some(PathBuf::from("out.ron")));
        assert!(parsed.verify);
        assert!(!parsed.debug);
    }

    #[test]
    fn rejects_missing_manifest() {
        assert!(args(&[]).is_err());
        assert!(args(&["--verify"]).is_err());
    }

    #[test]
    fn rejects_unknown_options() {
        assert!(args(&["build.ron", "--frobnicate"]).is_err());
    }

    const LIBRARY: &str = r#"
        LibraryFile(groups: [
            (name: "EXPORT_stage", nodes: [
                (
                    name: "RIG_STAGE_ROOT",
                    translation_mm: (5.0, 5.0, 0.0),
                    groupings: ["RIG_stage"],
                ),
                (
                    name: "hull",
                    parent: Some(0),
                    kind: Mesh(min: (0.0, 0.0, 0.0), max: (10.0, 10.0, 10.0)),
                ),
            ]),
        ])
    "#;

    #[test]
    fn builds_a_scene_document_from_a_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let library_path = dir.path().join("stage.ron");
        std::fs::write(&library_path, LIBRARY).unwrap();

        let out_path = dir.path().join("out/scene.ron");
        let manifest_path = dir.path().join("build.ron");
        let manifest = format!(
            r#"
            Manifest(
                output: (scene_path: "{out}"),
                root_name: "RIG_SCENE_ROOT",
                slots: {{
                    "stage": (
                        library: "{lib}",
                        group: "stage",
                        location_mm: (100.0, 0.0, 0.0),
                        rotation_deg: 90.0,
                        anchor_object: "RIG_STAGE_ROOT",
                    ),
                    "ghost": (
                        library: "{dir}/missing.ron",
                    ),
                }},
            )
            "#,
            out = out_path.display(),
            lib = library_path.display(),
            dir = dir.path().display(),
        );
        std::fs::write(&manifest_path, manifest).unwrap();

        let args = Args {
            manifest: manifest_path,
            output: None,
            verify: true,
            debug: false,
        };
        run(&args).unwrap();

        let text = std::fs::read_to_string(&out_path).unwrap();
        let back: SceneDocument = ron::from_str(&text).unwrap();

        // Root plus the stage slot's four chain links; the ghost slot's
        // missing library degrades to a warning and adds nothing.
        assert_eq!(back.nodes.len(), 5);

        let piv = back
            .nodes
            .iter()
            .find(|node| node.name == "PIV_stage")
            .unwrap();
        assert_eq!(piv.parent.as_deref(), Some("RIG_SCENE_ROOT"));
        assert_eq!(piv.translation_mm, [100.0, 0.0, 0.0]);

        let inst = back
            .nodes
            .iter()
            .find(|node| node.name == "INST_stage")
            .unwrap();
        let document::NodeRecordKind::Instance { group, .. } = &inst.kind else {
            panic!("INST_stage lost its group reference");
        };
        assert_eq!(group, "EXPORT_stage");
    }
}
