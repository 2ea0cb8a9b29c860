use std::path::PathBuf;

use anyhow::{Context, Result};

use occ_merge::data::sample::{synthetic_sounding, write_sounding, SimpleRng};

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let output_dir = PathBuf::from(args.next().unwrap_or_else(|| "sample_soundings".to_string()));
    let count: usize = match args.next() {
        Some(n) => n.parse().context("count must be a positive integer")?,
        None => 20,
    };

    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let levels = 150;

    for i in 0..count {
        let id = format!("G{:02}_2019.{:03}.{:02}", i % 32 + 1, 1 + i / 24, i % 24);
        let mut sounding = synthetic_sounding(&id, levels, &mut rng);

        // A few missing samples near the top of every profile.
        for (_, values) in &mut sounding.profiles {
            if let Some(last) = values.last_mut() {
                *last = f64::NAN;
            }
        }

        let path = output_dir.join(format!("atmPrf_{id}.nc"));
        write_sounding(&path, &sounding).with_context(|| format!("writing {}", path.display()))?;
    }

    // One partially processed file to exercise the skip path.
    let mut broken = synthetic_sounding("G99_2019.001.00", levels, &mut rng);
    broken.remove("bangle");
    let path = output_dir.join("atmPrf_broken.nc");
    write_sounding(&path, &broken).with_context(|| format!("writing {}", path.display()))?;

    println!(
        "Wrote {} soundings ({levels} levels each) plus one incomplete file to {}",
        count,
        output_dir.display()
    );
    Ok(())
}
