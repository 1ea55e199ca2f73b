#![allow(non_snake_case)]

use ssh_bands::{
    bands::HSSHParams,
    chop::{ Chop, CHOP_TOL },
    config::SweepConfig,
};

fn main() -> anyhow::Result<()> {
    let config: SweepConfig
        = match std::env::args().nth(1) {
            Some(path) => SweepConfig::load(path)?,
            None => SweepConfig::default(),
        };
    std::fs::create_dir_all(&config.outdir)?;

    let HSSHParams { t, tp, delta } = config.params;
    println!(
        "t = {}, tp = {}, delta = {}, kpoints = {}",
        t, tp, delta, config.kpoints,
    );
    let bands = config.run()?.chop(CHOP_TOL);
    if let Some((j, gap)) = bands.gap(0) {
        println!("minimum gap {:.6} at k = {:.6}", gap, bands.k()[j]);
    }

    let outfile = config.outdir.join(format!("ssh-bloch-{}-{}-{}.npz", t, tp, delta));
    bands.save_npz(&outfile)?;
    println!("wrote {}", outfile.display());

    println!("done");
    Ok(())
}
