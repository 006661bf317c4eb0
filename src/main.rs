mod cli;

use log::{info, warn};
use map_3d::{deg2rad, geodetic2ecef, Ellipsoid};
use std::fs::{create_dir_all, read_to_string, File};

use gnss_lsq::prelude::*;

use cli::Cli;

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::new();

    let cfg = match cli.config_path() {
        Some(path) => Config::from_json(&read_to_string(path)?)?,
        None => Config::default(),
    };
    info!("{:?}", cfg);

    let log = parse_log(File::open(cli.input_path())?)?;
    let store = EphemerisStore::from_csv(File::open(cli.ephemeris_path())?)?;

    let measurements = convert(&log.raw, Constellation::GPS);
    let epochs = segment(&measurements, &cfg.epoch)?;

    let mut solver = Solver::new(cfg);
    let solutions = solver.resolve(&epochs, &store);

    let outdir = cli.output_dir();
    create_dir_all(&outdir)?;

    match solver.first_states() {
        Some(states) => {
            let path = outdir.join("first_output.csv");
            write_satellites(File::create(&path)?, states, cli.clock_bias())?;
            info!("generated {}", path.display());
        },
        None => warn!("no epoch could be resolved: first_output.csv not generated"),
    }

    let path = outdir.join("lla_coordinates.csv");
    write_trajectory(File::create(&path)?, &solutions)?;
    info!("generated {}", path.display());

    let path = outdir.join("coordinates.kml");
    write_kml(File::create(&path)?, &solutions)?;
    info!("generated {}", path.display());

    if let (Some(fix), Some(solution)) = (log.fixes.first(), solutions.first()) {
        let (x, y, z) = geodetic2ecef(
            deg2rad(fix.latitude_ddeg),
            deg2rad(fix.longitude_ddeg),
            fix.altitude_m.unwrap_or_default(),
            Ellipsoid::WGS84,
        );
        let offset = (solution.position - Vector3::new(x, y, z)).norm();
        info!(
            "first solution is {:.3}m away from first device fix ({})",
            offset, fix.provider
        );
    }

    Ok(())
}
