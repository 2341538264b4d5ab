use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{info, warn};
use nalgebra::Vector3;
use rand::SeedableRng;

use propedit::{
    ControlPoint, DistanceMode, FalloffConfig, ProjectionAxis, PropagateConfig,
    ThreadCount,
    cloud::PointCloud,
    falloff::{Falloff, PropSize},
    island::{IslandOptions, Islands},
    point::{sort_by_distance, sort_selected_first},
    topology::Topology,
};

/// Proportional-editing distance and falloff demo
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Straight-line distances over a point cloud
    Cloud {
        #[clap(flatten)]
        source: CloudSource,

        #[clap(flatten)]
        settings: Settings,

        /// Ignore distances along this axis (e.g. `0,0,1`)
        #[clap(long, value_parser = parse_vec3)]
        project: Option<Vector3<f32>>,

        /// Check results against a brute-force search
        #[clap(long)]
        check: bool,
    },

    /// Distances over a square grid mesh, selected at its center
    Grid {
        /// Number of quads along each side
        #[clap(short, long, default_value_t = 32)]
        grid: u32,

        #[clap(flatten)]
        settings: Settings,

        /// Measure straight-line distance instead of connectivity
        #[clap(long)]
        spatial: bool,

        /// Also compute islands, so that points inherit their source's pivot
        #[clap(long)]
        islands: bool,
    },
}

#[derive(Parser)]
struct CloudSource {
    /// Point file to load (`x y z [s]` per line)
    ///
    /// If not provided, a random cloud is generated.
    #[clap(short, long)]
    input: Option<PathBuf>,

    /// Number of random points
    #[clap(long, default_value_t = 10_000)]
    random: usize,

    /// Fraction of random points which are selected
    #[clap(long, default_value_t = 0.05)]
    selected: f64,

    /// Seed for the random generator
    #[clap(long, default_value_t = 0)]
    seed: u64,
}

#[derive(Parser)]
struct Settings {
    /// Falloff curve (smooth, sphere, root, inverse-square, sharp, linear,
    /// constant, random)
    #[clap(short, long, default_value_t = Falloff::Smooth)]
    falloff: Falloff,

    /// Radius of influence
    #[clap(short = 'r', long, default_value_t = 1.0)]
    size: f32,

    /// Number of threads to use
    #[clap(short, long)]
    threads: Option<NonZeroUsize>,

    /// Name of a text file to write results into
    #[clap(short, long)]
    out: Option<PathBuf>,

    /// Number of times to run (for benchmarking)
    #[clap(short = 'N', default_value_t = 1)]
    n: usize,
}

fn parse_vec3(s: &str) -> Result<Vector3<f32>, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("{p:?}: {e}")))
        .collect::<Result<Vec<f32>, String>>()?;
    match parts.as_slice() {
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        _ => Err(format!("expected 3 components, got {}", parts.len())),
    }
}

////////////////////////////////////////////////////////////////////////////////

fn run(
    points: &mut [ControlPoint],
    mode: &DistanceMode<'_>,
    islands: Option<&Islands>,
    settings: &Settings,
) -> Result<()> {
    let cfg = PropagateConfig {
        threads: settings.threads.map(ThreadCount::from).unwrap_or_default(),
        ..Default::default()
    };
    let falloff = FalloffConfig {
        falloff: settings.falloff,
        size: PropSize::new(settings.size)?,
    };
    let mut rng = rand::thread_rng();

    let start = Instant::now();
    for _ in 0..settings.n {
        cfg.run(points, mode, islands)?;
        falloff.run(points, &mut rng);
    }
    info!(
        "Propagated {}x at {:?} ms/iter ({} threads)",
        settings.n,
        start.elapsed().as_micros() as f64 / 1000.0 / (settings.n as f64),
        cfg.threads,
    );

    let reached = points.iter().filter(|p| p.distance.is_some()).count();
    let influenced = points
        .iter()
        .filter(|p| !p.selected && p.factor > 0.0)
        .count();
    let max = points
        .iter()
        .filter_map(|p| p.distance)
        .fold(0.0f32, f32::max);
    info!(
        "{} points: {reached} reached, {influenced} influenced, max distance {max}",
        points.len()
    );
    Ok(())
}

fn write_out(points: Vec<ControlPoint>, out: Option<&PathBuf>) -> Result<()> {
    if let Some(out) = out {
        info!("Writing results to {out:?}");
        let cloud = PointCloud { points };
        let mut f = std::io::BufWriter::new(std::fs::File::create(out)?);
        cloud.write_results(&mut f)?;
    }
    Ok(())
}

fn grid(n: u32) -> (Vec<ControlPoint>, Topology) {
    let idx = |x: u32, y: u32| y * (n + 1) + x;
    let mut points = vec![];
    for y in 0..=n {
        for x in 0..=n {
            let pos = Vector3::new(x as f32, y as f32, 0.0) / n as f32;
            points.push(ControlPoint::new(pos, x == n / 2 && y == n / 2));
        }
    }
    let mut faces = vec![];
    for y in 0..n {
        for x in 0..n {
            faces.push(vec![
                idx(x, y),
                idx(x + 1, y),
                idx(x + 1, y + 1),
                idx(x, y + 1),
            ]);
        }
    }
    (points, Topology::from_faces(faces))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .init();

    let args = Args::parse();
    match args.cmd {
        Command::Cloud {
            source,
            settings,
            project,
            check,
        } => {
            let now = Instant::now();
            let mut cloud = match &source.input {
                Some(path) => {
                    let file = std::fs::File::open(path)?;
                    PointCloud::from_text(std::io::BufReader::new(file))?
                }
                None => {
                    let mut rng = rand::rngs::StdRng::seed_from_u64(source.seed);
                    PointCloud::random(source.random, source.selected, &mut rng)?
                }
            };
            info!(
                "Loaded {} points in {:?}",
                cloud.points.len(),
                now.elapsed()
            );
            if !cloud.points.iter().any(|p| p.selected) {
                warn!("no points are selected; every distance is undefined");
            }

            let projection = project.map(ProjectionAxis::new).transpose()?;
            let mode = DistanceMode::Spatial { projection };
            let points = &mut cloud.points;
            sort_selected_first(points);
            run(points, &mode, None, &settings)?;
            sort_by_distance(points);

            if check {
                let start = Instant::now();
                let flat = |v: Vector3<f32>| match &projection {
                    Some(a) => a.project(&v),
                    None => v,
                };
                for (i, p) in points.iter().enumerate().filter(|(_, p)| !p.selected) {
                    let expected = points
                        .iter()
                        .filter(|s| s.selected)
                        .map(|s| (flat(s.pos) - flat(p.pos)).norm())
                        .min_by(f32::total_cmp);
                    let ok = match (p.distance, expected) {
                        (Some(a), Some(b)) => (a - b).abs() < 1e-5,
                        (a, b) => a == b,
                    };
                    if !ok {
                        bail!(
                            "point {i}: got {:?}, brute force gives {expected:?}",
                            p.distance
                        );
                    }
                }
                info!("Brute-force check passed in {:?}", start.elapsed());
            }
            write_out(cloud.points, settings.out.as_ref())?;
        }
        Command::Grid {
            grid: n,
            settings,
            spatial,
            islands,
        } => {
            if n == 0 {
                bail!("grid must have at least one quad per side");
            }
            let (mut points, topology) = grid(n);
            let islands = if islands {
                let opts = IslandOptions {
                    single_islands: true,
                    calc_axis: true,
                };
                Some(Islands::from_topology(&mut points, &topology, opts)?)
            } else {
                None
            };
            let mode = if spatial {
                DistanceMode::Spatial { projection: None }
            } else {
                DistanceMode::Connected {
                    topology: &topology,
                }
            };
            run(&mut points, &mode, islands.as_ref(), &settings)?;
            write_out(points, settings.out.as_ref())?;
        }
    }

    Ok(())
}
