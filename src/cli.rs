use clap::{Arg, ArgAction, ArgMatches, ColorChoice, Command};
use std::path::{Path, PathBuf};

pub struct Cli {
    /// arguments passed by user
    pub matches: ArgMatches,
}

impl Cli {
    pub fn new() -> Self {
        Self {
            matches: {
                Command::new("gnss-lsq")
                    .version(env!("CARGO_PKG_VERSION"))
                    .about("Receiver trajectory from raw GNSS measurements and broadcast ephemerides")
                    .arg_required_else_help(true)
                    .color(ColorChoice::Always)
                    .arg(
                        Arg::new("input")
                            .help("Receiver log (GnssLogger text format)")
                            .required(true),
                    )
                    .arg(
                        Arg::new("ephemeris")
                            .short('e')
                            .long("ephemeris")
                            .help("Broadcast ephemeris table (CSV)")
                            .required(true),
                    )
                    .arg(
                        Arg::new("config")
                            .short('c')
                            .long("config")
                            .help("Solver configuration (JSON). Omitted fields use default values."),
                    )
                    .next_help_heading("Output")
                    .arg(
                        Arg::new("output")
                            .short('o')
                            .long("output")
                            .help("Output directory, defaults to the current directory"),
                    )
                    .arg(
                        Arg::new("clock-bias")
                            .long("clock-bias")
                            .help("Include satellite clock bias in first_output.csv")
                            .action(ArgAction::SetTrue),
                    )
                    .get_matches()
            },
        }
    }
    pub fn input_path(&self) -> PathBuf {
        Path::new(self.matches.get_one::<String>("input").unwrap()).to_path_buf()
    }
    pub fn ephemeris_path(&self) -> PathBuf {
        Path::new(self.matches.get_one::<String>("ephemeris").unwrap()).to_path_buf()
    }
    pub fn config_path(&self) -> Option<PathBuf> {
        self.matches
            .get_one::<String>("config")
            .map(|path| Path::new(path).to_path_buf())
    }
    pub fn output_dir(&self) -> PathBuf {
        match self.matches.get_one::<String>("output") {
            Some(path) => Path::new(path).to_path_buf(),
            None => PathBuf::from("."),
        }
    }
    pub fn clock_bias(&self) -> bool {
        self.matches.get_flag("clock-bias")
    }
}
