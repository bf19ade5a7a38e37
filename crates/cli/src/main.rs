mod provenance;

use anyhow::{bail, Context, Result};
use bigger::api::{
    biflute, flute, random_word, ComponentKind, Lamination, MappingClassGroup, ReplayToken, WordCfg,
};
use clap::{Parser, Subcommand, ValueEnum};
use provenance::{current_git_rev, write_sidecar, Payload};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;

const MAX_EDGE: i64 = 1 << 48;

#[derive(Parser)]
#[command(name = "bigger-cli")]
#[command(about = "Mapping classes of flute surfaces acting on laminations")]
struct Cmd {
    /// Example surface to load
    #[arg(long, value_enum, default_value_t = Surface::Flute)]
    surface: Surface,

    #[command(subcommand)]
    action: Action,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Surface {
    Flute,
    Biflute,
}

impl Surface {
    fn load(self) -> MappingClassGroup<i64> {
        match self {
            Surface::Flute => flute(),
            Surface::Biflute => biflute(),
        }
    }

    /// Edge labels accepted from input. Links and generators shift labels by
    /// a few squares, so labels stay well inside `i64`.
    fn has_edge(self, edge: i64) -> bool {
        let lowest = match self {
            Surface::Flute => -1,
            Surface::Biflute => -MAX_EDGE,
        };
        (lowest..=MAX_EDGE).contains(&edge)
    }

    fn name(self) -> &'static str {
        match self {
            Surface::Flute => "flute",
            Surface::Biflute => "biflute",
        }
    }
}

#[derive(Subcommand)]
enum Action {
    /// Apply a `.`-separated word of generators to a lamination
    Apply {
        #[arg(long)]
        word: String,
        /// JSON object of edge weights, or `@path` to read it from a file
        #[arg(long)]
        lamination: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Shorten a lamination and list its components
    Shorten {
        #[arg(long)]
        lamination: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Geometric intersection number of two laminations
    Intersect {
        /// Multicurve, as JSON weights or `@path`
        #[arg(long)]
        curve: String,
        #[arg(long)]
        lamination: String,
    },
    /// Draw a reproducible random word in the `a<n>` generators
    Word {
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 0)]
        index: u64,
        #[arg(long, default_value_t = 6)]
        length: usize,
        /// Number of curves `a0, a1, ...` to draw from
        #[arg(long, default_value_t = 3)]
        curves: usize,
    },
    /// Print version and commit information
    Report,
}

#[derive(Serialize)]
struct LaminationOut {
    weights: BTreeMap<i64, i64>,
    complexity: i64,
}

impl LaminationOut {
    fn new(lam: &Lamination<i64>) -> Result<Self> {
        Ok(Self {
            weights: lam.to_map()?,
            complexity: lam.complexity()?,
        })
    }
}

#[derive(Serialize)]
struct ComponentOut {
    kind: &'static str,
    edges: Vec<i64>,
    multiplicity: i64,
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Apply {
            word,
            lamination,
            out,
        } => apply(cmd.surface, &word, &lamination, out.as_deref()),
        Action::Shorten { lamination, out } => shorten(cmd.surface, &lamination, out.as_deref()),
        Action::Intersect { curve, lamination } => intersect(cmd.surface, &curve, &lamination),
        Action::Word {
            seed,
            index,
            length,
            curves,
        } => word(seed, index, length, curves),
        Action::Report => report(),
    }
}

/// Parse `{"1": -1, "4": 2}` (inline or from `@path`) onto the surface.
fn read_lamination(surface: Surface, mcg: &MappingClassGroup<i64>, arg: &str) -> Result<Lamination<i64>> {
    let text = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?,
        None => arg.to_string(),
    };
    let weights: BTreeMap<i64, i64> =
        serde_json::from_str(&text).context("lamination must be a JSON object of edge weights")?;
    if let Some(edge) = weights.keys().find(|&&e| !surface.has_edge(e)) {
        bail!("edge {edge} is not an edge of the {}", surface.name());
    }
    Ok(mcg.triangulation().lamination_from_weights(weights))
}

fn emit(value: &serde_json::Value, out: Option<&Path>, payload: Payload) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    match out {
        None => println!("{text}"),
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("creating {}", parent.display()))?;
                }
            }
            std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
            let sidecar = write_sidecar(path, &payload)?;
            tracing::info!(out = %path.display(), sidecar = %sidecar.display(), "wrote");
        }
    }
    Ok(())
}

fn apply(surface: Surface, word: &str, lamination: &str, out: Option<&Path>) -> Result<()> {
    tracing::info!(surface = surface.name(), word, "apply");
    let mcg = surface.load();
    let lam = read_lamination(surface, &mcg, lamination)?;
    let image = mcg
        .apply(word, &lam)
        .with_context(|| format!("applying {word:?}"))?;
    let value = json!({
        "input": LaminationOut::new(&lam)?,
        "image": LaminationOut::new(&image)?,
    });
    let payload = Payload::new(
        surface.name(),
        "apply",
        json!({"word": word, "lamination": lam.to_map()?}),
    );
    emit(&value, out, payload)
}

fn shorten(surface: Surface, lamination: &str, out: Option<&Path>) -> Result<()> {
    tracing::info!(surface = surface.name(), "shorten");
    let mcg = surface.load();
    let lam = read_lamination(surface, &mcg, lamination)?;
    let short = lam.shorten().context("shortening")?;
    let components: Vec<ComponentOut> = short
        .components
        .iter()
        .map(|c| {
            let (kind, edges) = match &c.kind {
                ComponentKind::Peripheral => ("peripheral", Vec::new()),
                ComponentKind::Arc(e) => ("arc", vec![*e]),
                ComponentKind::Curve(annulus) => {
                    let (x, y) = annulus.edges();
                    ("curve", vec![x, y])
                }
            };
            ComponentOut {
                kind,
                edges,
                multiplicity: c.multiplicity,
            }
        })
        .collect();
    let value = json!({
        "input": LaminationOut::new(&lam)?,
        "short": LaminationOut::new(&short.lamination)?,
        "conjugator_length": short.conjugator.len(),
        "components": components,
    });
    let payload = Payload::new(surface.name(), "shorten", json!({"lamination": lam.to_map()?}));
    emit(&value, out, payload)
}

fn intersect(surface: Surface, curve: &str, lamination: &str) -> Result<()> {
    let mcg = surface.load();
    let curve = read_lamination(surface, &mcg, curve)?;
    let lam = read_lamination(surface, &mcg, lamination)?;
    let i = curve.intersection(&lam).context("intersection")?;
    tracing::info!(surface = surface.name(), intersection = i, "intersect");
    println!("{i}");
    Ok(())
}

fn word(seed: u64, index: u64, length: usize, curves: usize) -> Result<()> {
    let cfg = WordCfg {
        length,
        generators: (0..curves).map(|n| format!("a{n}")).collect(),
        ..WordCfg::default()
    };
    println!("{}", random_word(&cfg, ReplayToken { seed, index }));
    Ok(())
}

fn report() -> Result<()> {
    let obj = json!({
        "code_rev": current_git_rev(),
        "bigger_version": bigger::VERSION,
        "surfaces": ["flute", "biflute"],
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_near_the_integer_bounds_are_rejected() {
        for surface in [Surface::Flute, Surface::Biflute] {
            assert!(surface.has_edge(0));
            assert!(surface.has_edge(MAX_EDGE));
            assert!(!surface.has_edge(i64::MAX));
            assert!(!surface.has_edge(i64::MAX - 1));
            assert!(!surface.has_edge(i64::MIN));
        }
        assert!(!Surface::Flute.has_edge(-2));
        assert!(Surface::Biflute.has_edge(-MAX_EDGE));
        assert!(!Surface::Biflute.has_edge(-MAX_EDGE - 1));
    }

    #[test]
    fn out_of_range_lamination_input_is_an_error() {
        let surface = Surface::Biflute;
        let mcg = surface.load();
        let text = format!("{{\"{}\": 1}}", i64::MAX);
        let err = read_lamination(surface, &mcg, &text).unwrap_err();
        assert!(err.to_string().contains("is not an edge of the biflute"));
        let lam = read_lamination(surface, &mcg, "{\"-4\": -1}").unwrap();
        assert_eq!(lam.to_map().unwrap(), BTreeMap::from([(-4, -1)]));
    }
}
