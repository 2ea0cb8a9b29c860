use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use occ_merge::analysis::binning::binned_average;
use occ_merge::analysis::derivative::{append_average_log_derivative, slope_column_name};
use occ_merge::config::{FloatFormat, MergeConfig, ReadOptions, SerializeOptions};
use occ_merge::data::filter::select_ids;
use occ_merge::data::loader::load_table;
use occ_merge::data::merge::merge_to_file;
use occ_merge::data::model::Table;
use occ_merge::data::parquet_io::write_parquet;
use occ_merge::data::writer::write_table;

#[derive(Debug, Parser)]
#[command(version, about = "Merge occultation netCDF files into one table")]
struct Command {
    /// Field separator of delimited files [default: |]
    #[arg(short, long, global = true)]
    separator: Option<char>,
    /// Identifier column, kept as text [default: occ_id]
    #[arg(long, global = true)]
    id: Option<String>,
    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Merge every file in DIR whose name starts with PREFIX.
    Merge(MergeArgs),
    /// Append the average d(ln VARIABLE)/d(WRT) of every row as a new column.
    Slope {
        input: PathBuf,
        #[arg(long)]
        variable: String,
        #[arg(long)]
        wrt: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print the average of Y within bins of X.
    Bins {
        input: PathBuf,
        #[arg(short, long)]
        x: String,
        #[arg(short, long)]
        y: String,
        #[arg(long)]
        start: f64,
        #[arg(long)]
        stop: f64,
        #[arg(long)]
        width: f64,
        /// Restrict to these identifiers.
        #[arg(long = "select")]
        ids: Vec<String>,
    },
    /// Convert between delimited text and Parquet, chosen by extension.
    Convert { input: PathBuf, output: PathBuf },
}

#[derive(Debug, Args)]
struct MergeArgs {
    directory: PathBuf,
    /// File name prefix [default: none, every file]
    #[arg(short, long)]
    prefix: Option<String>,
    #[arg(short, long)]
    output: PathBuf,
    /// Comma separated variable list (defaults to the standard 15).
    #[arg(long, value_delimiter = ',')]
    variables: Vec<String>,
    /// JSON file with a MergeConfig; flags given on the command line
    /// override its fields.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Also write the merged table as Parquet.
    #[arg(long)]
    parquet: Option<PathBuf>,
    /// Digits after the decimal point (full precision when omitted).
    #[arg(long)]
    precision: Option<usize>,
}

impl MergeArgs {
    /// The config file (or defaults) with every given flag applied on top.
    fn into_config(self, separator: Option<char>, id: Option<String>) -> Result<MergeConfig> {
        let mut merge = match &self.config {
            Some(path) => MergeConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => MergeConfig::default(),
        };
        merge.directory = self.directory;
        merge.output = self.output;
        if let Some(prefix) = self.prefix {
            merge.prefix = prefix;
        }
        if let Some(separator) = separator {
            merge.separator = separator;
        }
        if let Some(id) = id {
            merge.id_variable = id;
        }
        if !self.variables.is_empty() {
            merge.variables = self.variables;
        }
        if let Some(digits) = self.precision {
            merge.serialize.float_format = FloatFormat::Fixed(digits);
        }
        Ok(merge)
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Command::parse()) {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(cmd: Command) -> Result<()> {
    let defaults = ReadOptions::default();
    let read_options = ReadOptions {
        separator: cmd.separator.unwrap_or(defaults.separator),
        id_column: cmd.id.clone().unwrap_or(defaults.id_column),
    };

    match cmd.action {
        Action::Merge(args) => {
            let parquet = args.parquet.clone();
            let merge = args.into_config(cmd.separator, cmd.id)?;

            let (table, summary) = merge_to_file(&merge).context("merging directory")?;
            println!(
                "merged {} of {} files ({} skipped) into {}",
                summary.merged,
                summary.matched,
                summary.skipped,
                merge.output.display()
            );
            if let Some(path) = parquet {
                write_parquet(&table, &path)
                    .with_context(|| format!("writing {}", path.display()))?;
            }
        }
        Action::Slope {
            input,
            variable,
            wrt,
            name,
            output,
        } => {
            let mut table = load(&input, &read_options)?;
            let name = name.unwrap_or_else(|| slope_column_name(&variable, &wrt));
            append_average_log_derivative(&mut table, &variable, &wrt, &name)
                .context("computing slopes")?;
            save(&table, &output, read_options.separator)?;
        }
        Action::Bins {
            input,
            x,
            y,
            start,
            stop,
            width,
            ids,
        } => {
            let mut table = load(&input, &read_options)?;
            if !ids.is_empty() {
                table = select_ids(&table, &read_options.id_column, &ids)?;
            }
            let bins = binned_average(&table, &x, &y, start, stop, width)
                .context("computing binned averages")?;
            println!("{:>14} {:>14} {:>8}", x, y, "count");
            for bin in bins {
                println!("{:>14.6} {:>14.6} {:>8}", bin.center, bin.mean, bin.count);
            }
        }
        Action::Convert { input, output } => {
            let table = load(&input, &read_options)?;
            save(&table, &output, read_options.separator)?;
        }
    }
    Ok(())
}

fn load(path: &Path, options: &ReadOptions) -> Result<Table> {
    load_table(path, options).with_context(|| format!("reading {}", path.display()))
}

fn save(table: &Table, path: &Path, separator: char) -> Result<()> {
    let is_parquet = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("parquet" | "pq")
    );
    if is_parquet {
        write_parquet(table, path)
    } else {
        write_table(table, path, separator, &SerializeOptions::default())
    }
    .with_context(|| format!("writing {}", path.display()))?;
    log::info!("wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merge_args(argv: &[&str]) -> (MergeArgs, Option<char>, Option<String>) {
        let cmd = Command::try_parse_from(argv).unwrap();
        match cmd.action {
            Action::Merge(args) => (args, cmd.separator, cmd.id),
            other => panic!("expected merge, got {other:?}"),
        }
    }

    #[test]
    fn config_file_fields_survive_when_flags_are_absent() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("cfg.json");
        std::fs::write(
            &config,
            r#"{ "prefix": "atmPrf_", "separator": ";", "id_variable": "sid" }"#,
        )
        .unwrap();
        let config = config.to_str().unwrap();

        let (args, sep, id) =
            merge_args(&["occ-merge", "merge", "data", "-o", "out.csv", "--config", config]);
        let merge = args.into_config(sep, id).unwrap();
        assert_eq!(merge.prefix, "atmPrf_");
        assert_eq!(merge.separator, ';');
        assert_eq!(merge.id_variable, "sid");
        assert_eq!(merge.directory, PathBuf::from("data"));
    }

    #[test]
    fn flags_override_config_file_fields() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("cfg.json");
        std::fs::write(&config, r#"{ "prefix": "atmPrf_", "separator": ";" }"#).unwrap();
        let config = config.to_str().unwrap();

        let (args, sep, id) = merge_args(&[
            "occ-merge", "-s", ",", "--id", "sid", "merge", "data", "-o", "out.csv",
            "--config", config, "-p", "wetPrf_", "--precision", "4",
        ]);
        let merge = args.into_config(sep, id).unwrap();
        assert_eq!(merge.prefix, "wetPrf_");
        assert_eq!(merge.separator, ',');
        assert_eq!(merge.id_variable, "sid");
        assert_eq!(merge.serialize.float_format, FloatFormat::Fixed(4));
    }

    #[test]
    fn defaults_apply_without_config_or_flags() {
        let (args, sep, id) = merge_args(&["occ-merge", "merge", "data", "-o", "out.csv"]);
        let merge = args.into_config(sep, id).unwrap();
        assert_eq!(merge, MergeConfig {
            directory: "data".into(),
            output: "out.csv".into(),
            ..Default::default()
        });
    }

    #[test]
    fn bins_accepts_long_axis_flags() {
        let cmd = Command::try_parse_from([
            "occ-merge", "bins", "m.csv", "--x", "lat", "--y", "roc", "--start", "0",
            "--stop", "10", "--width", "1", "--select", "A", "--select", "B",
        ])
        .unwrap();
        let Action::Bins { x, y, ids, .. } = cmd.action else {
            panic!("expected bins");
        };
        assert_eq!((x.as_str(), y.as_str()), ("lat", "roc"));
        assert_eq!(ids, ["A", "B"]);
    }
}
