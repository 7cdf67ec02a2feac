use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

/// Write synthetic TraceWin-style particle files for trying out `dst-plot`.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Directory the files are written to
    #[arg(default_value = ".")]
    out_dir: PathBuf,

    /// Particles in the distribution file
    #[arg(short, long, default_value_t = 100_000)]
    particles: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

const COLUMNS: &str = "x(mm) x'(mrad) y(mm) y'(mrad) Phase(deg) Energy(MeV)";

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// A correlated Gaussian pair in one transverse plane.
fn transverse(rng: &mut SimpleRng, sigma_pos: f64, sigma_ang: f64, corr: f64) -> (f64, f64) {
    let pos = rng.gauss(0.0, sigma_pos);
    let ang = corr * pos * sigma_ang / sigma_pos
        + rng.gauss(0.0, sigma_ang * (1.0 - corr * corr).sqrt());
    (pos, ang)
}

/// Beam out of the RFQ: about 99.3 MeV, a few degrees of phase spread.
fn distribution_row(rng: &mut SimpleRng) -> [f64; 6] {
    let (x, xp) = transverse(rng, 6.0, 4.0, -0.5);
    let (y, yp) = transverse(rng, 6.0, 4.0, 0.4);
    let phase = rng.gauss(0.0, 4.0);
    let energy = 99.3 + rng.gauss(0.0, 0.25) - 0.002 * phase * phase;
    [x, xp, y, yp, phase, energy]
}

/// Particles that survive the lattice: uniformly filled ellipses around the
/// input energy of 16.5 MeV. Rejection sampling per plane.
fn acceptance_row(rng: &mut SimpleRng) -> [f64; 6] {
    let mut ellipse = |a: f64, b: f64| loop {
        let (u, v) = (rng.uniform(-1.0, 1.0), rng.uniform(-1.0, 1.0));
        if u * u + v * v <= 1.0 {
            break (a * u, b * v);
        }
    };
    let (x, xp) = ellipse(30.0, 18.0);
    let (y, yp) = ellipse(28.0, 20.0);
    let (phase, de) = ellipse(15.0, 0.35);
    [x, xp, y, yp, phase, 16.5 + de]
}

fn write_particles(
    path: &Path,
    title: &str,
    rows: usize,
    rng: &mut SimpleRng,
    mut row: impl FnMut(&mut SimpleRng) -> [f64; 6],
) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "{title}")?;
    writeln!(out, "Particles: {rows}")?;
    writeln!(out, "{COLUMNS}")?;
    for _ in 0..rows {
        let values = row(rng);
        let line: Vec<String> = values.iter().map(|v| format!("{v:.6}")).collect();
        writeln!(out, "{}", line.join(" "))?;
    }
    out.flush()
        .with_context(|| format!("writing {}", path.display()))?;
    log::info!("Wrote {rows} particles to {}", path.display());
    Ok(())
}

fn init_logging() {
    // A second call, as in tests, keeps the first logger.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    let distribution = args.out_dir.join("part_rfq.txt");
    write_particles(
        &distribution,
        "Synthetic RFQ output distribution",
        args.particles,
        &mut rng,
        distribution_row,
    )?;

    let accepted = args.out_dir.join("accepted.txt");
    let accepted_rows = (args.particles / 5).max(1);
    write_particles(
        &accepted,
        "Synthetic linac acceptance",
        accepted_rows,
        &mut rng,
        acceptance_row,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dst_util::data::loader::load_file;

    #[test]
    fn logging_is_initialised() {
        init_logging();
        init_logging();
        assert!(log::log_enabled!(log::Level::Error));
    }

    #[test]
    fn generated_files_load_as_particle_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accepted.txt");
        let mut rng = SimpleRng::new(7);
        write_particles(&path, "test", 250, &mut rng, acceptance_row).unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.len(), 250);
        let energy = table.column("Energy(MeV)").unwrap();
        assert!(energy.iter().all(|e| (16.0..17.0).contains(e)));
    }
}
