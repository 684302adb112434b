//! User-facing output: pose formatting, error listings and document summaries.

use std::fmt::Write as _;

use colored::Colorize;
use sdfgraph_types::{Model, Pose, Root, World};

use crate::commands::ScopeReport;
use crate::config::{AngleUnit, Config};

/// `x y z roll pitch yaw` with the configured precision and angle unit.
pub fn format_pose(pose: Pose, cfg: &Config) -> String {
    let mut values: [f64; 6] = pose.into();
    if cfg.angle_unit == AngleUnit::Degrees {
        for v in &mut values[3..] {
            *v = v.to_degrees();
        }
    }
    values
        .iter()
        .map(|v| {
            let v = if v.abs() < 1e-12 { 0.0 } else { *v };
            let s = format!("{v:.prec$}", prec = cfg.precision);
            // Rounding can still produce "-0.000".
            match s.strip_prefix('-') {
                Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
                _ => s,
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Print every error of every scope.  Returns the total error count.
pub fn print_reports(reports: &[ScopeReport]) -> usize {
    let mut total = 0;
    for report in reports {
        if report.errors.is_empty() {
            println!("  {} {}", "✓".green().bold(), report.label.bold());
            continue;
        }
        println!(
            "  {} {} – {} error(s)",
            "✗".red().bold(),
            report.label.bold(),
            report.errors.len()
        );
        for error in &report.errors {
            println!("      {} {}", format!("[{}]", error.code).red(), error.message);
        }
        total += report.errors.len();
    }
    total
}

/// Indented tree of the worlds, models and their entities.
pub fn summary(root: &Root, cfg: &Config) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "version {}: {} world(s), {} model(s), {} light(s)",
        root.version,
        root.world_count(),
        root.model_count(),
        root.lights.len()
    );
    for world in &root.worlds {
        world_summary(&mut out, world, cfg);
    }
    for model in &root.models {
        model_summary(&mut out, model, 1, cfg);
    }
    for light in &root.lights {
        let _ = writeln!(out, "  light {} ({})", light.name, light.kind);
    }
    out
}

fn world_summary(out: &mut String, world: &World, cfg: &Config) {
    let _ = writeln!(
        out,
        "  world {}: {} model(s), {} frame(s), {} light(s)",
        world.name,
        world.model_count(),
        world.frame_count(),
        world.light_count()
    );
    for frame in &world.frames {
        let _ = writeln!(out, "    frame {}", frame.name);
    }
    for light in &world.lights {
        let _ = writeln!(out, "    light {} ({})", light.name, light.kind);
    }
    for model in &world.models {
        model_summary(out, model, 2, cfg);
    }
}

fn model_summary(out: &mut String, model: &Model, depth: usize, cfg: &Config) {
    let pad = "  ".repeat(depth);
    let _ = writeln!(
        out,
        "{pad}model {}: {} link(s), {} joint(s), {} frame(s), {} model(s)",
        model.name,
        model.link_count(),
        model.joint_count(),
        model.frame_count(),
        model.model_count()
    );
    match model.relative_to.as_str() {
        "" => {
            let _ = writeln!(out, "{pad}  pose {}", format_pose(model.pose, cfg));
        }
        frame => {
            let pose = format_pose(model.pose, cfg);
            let _ = writeln!(out, "{pad}  pose {pose} (relative to {frame})");
        }
    }
    let _ = writeln!(
        out,
        "{pad}  static {}, self_collide {}, allow_auto_disable {}, enable_wind {}",
        model.is_static, model.self_collide, model.allow_auto_disable, model.enable_wind
    );
    for link in &model.links {
        let _ = writeln!(out, "{pad}  link {}", link.name);
    }
    for joint in &model.joints {
        let _ = writeln!(
            out,
            "{pad}  joint {} ({}): {} -> {}",
            joint.name, joint.kind, joint.parent, joint.child
        );
    }
    for frame in &model.frames {
        match frame.attached_to.as_str() {
            "" => {
                let _ = writeln!(out, "{pad}  frame {}", frame.name);
            }
            target => {
                let _ = writeln!(out, "{pad}  frame {} (attached to {target})", frame.name);
            }
        }
    }
    for nested in &model.models {
        model_summary(out, nested, depth + 1, cfg);
    }
}
