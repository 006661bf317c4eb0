use crate::{
    cfg::Config,
    constants::WEEK_SECONDS,
    ephemeris::EphemerisStore,
    epoch::segment,
    export::{write_kml, write_satellites, write_trajectory},
    logfile::parse_log,
    measurement::convert,
    prelude::{Constellation, Solver},
    tests::{ephemeris_csv, init_logger, receiver, transmission, RX_BIAS_M, VISIBLE, WEEK},
};

const HEADER: &str = "# Version: v3.0.0.1 Platform: 12 Manufacturer: test Model: synthetic
#
# Raw,utcTimeMillis,TimeNanos,LeapSecond,FullBiasNanos,BiasNanos,Svid,TimeOffsetNanos,ReceivedSvTimeNanos,ReceivedSvTimeUncertaintyNanos,Cn0DbHz,PseudorangeRateMetersPerSecond,ConstellationType
#
# Fix,Provider,LatitudeDegrees,LongitudeDegrees,AltitudeMeters,SpeedMps,AccuracyMeters,BearingDegrees,UnixTimeMillis
#
";

/// Android receiver log: epoch k received at 520000 + k (time of week)
fn gnss_log() -> String {
    let gps_nanos = |tow: f64| {
        (WEEK as f64 * WEEK_SECONDS) as i64 * 1_000_000_000 + (tow * 1.0E9).round() as i64
    };

    let time_nanos_0 = 5_000_000_000_i64;
    let full_bias_nanos = time_nanos_0 - gps_nanos(520000.0);

    let raw = |time_nanos: i64, prn: u8, rx_sv_time_nanos: i64, constellation: u8| {
        format!(
            "Raw,0,{},18,{},0.0,{},0.0,{},20,35.5,-120.0,{}\n",
            time_nanos, full_bias_nanos, prn, rx_sv_time_nanos, constellation
        )
    };

    let mut content = HEADER.to_string();

    for k in 0..4 {
        let t_rx = 520000.0 + k as f64;
        let time_nanos = time_nanos_0 + k * 1_000_000_000;

        // last epoch: not enough satellites
        let prns = if k < 3 { &VISIBLE[..] } else { &VISIBLE[..3] };

        for prn in prns {
            let (t_tx, _) = transmission(*prn, t_rx);
            let rx_sv_time_nanos = (t_tx * 1.0E9).round() as i64;
            content.push_str(&raw(time_nanos, *prn, rx_sv_time_nanos, 1));

            if *prn == 5 {
                // duplicate: dropped
                content.push_str(&raw(time_nanos, *prn, rx_sv_time_nanos - 1000, 1));
                // glonass: dropped
                content.push_str(&raw(time_nanos, *prn, rx_sv_time_nanos, 3));
            }
        }

        // pseudo range too long: dropped
        let (t_tx, _) = transmission(12, t_rx);
        content.push_str(&raw(time_nanos, 12, ((t_tx - 0.5) * 1.0E9).round() as i64, 1));

        if k == 0 {
            content.push_str("Fix,gps,32.16670,34.80470,1586.9,0.0,5.0,0.0,1713037881000\n");
        }
    }
    content
}

#[test]
fn receiver_log() {
    init_logger();
    let cfg = Config::default();

    let log = parse_log(gnss_log().as_bytes()).unwrap();
    assert_eq!(log.raw.len(), 3 * (VISIBLE.len() + 3) + 3 + 3);
    assert_eq!(log.fixes.len(), 1);

    let measurements = convert(&log.raw, Constellation::GPS);
    assert_eq!(measurements.len(), log.raw.len() - 4);
    assert!(measurements.iter().all(|m| m.week == WEEK));

    let epochs = segment(&measurements, &cfg.epoch).unwrap();
    assert_eq!(epochs.len(), 4);
    for epoch in epochs.iter().take(3) {
        let prns = epoch.satellites().iter().map(|sv| sv.prn).collect::<Vec<_>>();
        assert_eq!(prns, VISIBLE.to_vec());
    }
    assert_eq!(epochs[3].len(), 3);

    let store = EphemerisStore::from_csv(ephemeris_csv(&VISIBLE).as_bytes()).unwrap();
    assert_eq!(store.len(), VISIBLE.len());

    let mut solver = Solver::new(cfg);
    let solutions = solver.resolve(&epochs, &store);
    assert_eq!(solutions.len(), 3);

    for solution in solutions.iter() {
        // transmission times are rounded to the nanosecond
        let err = (solution.position - receiver()).norm();
        assert!(err < 2.0, "position error {}", err);
        assert!((solution.bias_m - RX_BIAS_M).abs() < 2.0);
    }

    let fix = &log.fixes[0];
    let (lat, lon, _) = solutions[0].geodetic_ddeg();
    assert!((lat - fix.latitude_ddeg).abs() < 1.0E-4);
    assert!((lon - fix.longitude_ddeg).abs() < 1.0E-4);

    let mut first_output = Vec::<u8>::new();
    write_satellites(&mut first_output, solver.first_states().unwrap(), false).unwrap();
    let first_output = String::from_utf8(first_output).unwrap();
    let lines = first_output.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), VISIBLE.len() + 1);
    assert!(lines[1].starts_with("G01,"));

    let mut trajectory = Vec::<u8>::new();
    write_trajectory(&mut trajectory, &solutions).unwrap();
    assert_eq!(String::from_utf8(trajectory).unwrap().lines().count(), 4);

    let mut kml = Vec::<u8>::new();
    write_kml(&mut kml, &solutions).unwrap();
    assert_eq!(String::from_utf8(kml).unwrap().matches("<Placemark").count(), 3);
}
