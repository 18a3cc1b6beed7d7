//! farmbook-query - Query a farmbook record file.
//!
//! Reads a JSON array of records, runs one query over it and prints the
//! ordered rows followed by column totals, the debit/credit balance for
//! ledger schemas, and optional group sums.
//!
//! # Usage
//!
//! ```bash
//! farmbook-query journal.json --filter account=Bank --sort credit --desc
//! farmbook-query journal.json --date-range last30days --format json
//! farmbook-query feeding.json --schema feeding --group-by animalGroup --sum amount
//! farmbook-query sales.json --schema sales --period month --sum amount
//! ```

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{ArgGroup, Parser, ValueEnum};
use farmbook_core::{validate_ledger, validate_records, Record};
use farmbook_query::{
    balance_check, sum_field, Aggregator, BalanceCheck, DateRange, Executor, FieldType, OrderSpec,
    Period, QueryError, QueryResult, QuerySpec, Schema, SortDirection,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;

/// Group label for records that do not carry the grouping dimension.
const MISSING_GROUP: &str = "(none)";

/// Query a farmbook record file.
#[derive(Parser, Debug)]
#[command(name = "farmbook-query")]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("grouping").args(["group_by", "period"])))]
pub struct Args {
    /// JSON file holding an array of records
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Built-in schema: general-ledger, purchase-ledger, sales, feeding or inventory
    #[arg(short, long, value_name = "NAME")]
    pub schema: Option<String>,

    /// Read the schema from a JSON file instead
    #[arg(long, value_name = "SCHEMA_FILE", conflicts_with = "schema")]
    pub schema_file: Option<PathBuf>,

    /// Case-insensitive text to look for in searchable fields
    #[arg(long, value_name = "TEXT", default_value = "")]
    pub search: String,

    /// Keep records whose DIM equals VALUE (can be given multiple times)
    #[arg(long = "filter", value_name = "DIM=VALUE", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,

    /// Date window: all, last7days, last30days, last90days, thisYear or FROM..TO
    #[arg(long, value_name = "RANGE", default_value = "all")]
    pub date_range: DateRange,

    /// Field to sort by
    #[arg(long, value_name = "KEY", default_value = "date")]
    pub sort: String,

    /// Sort descending
    #[arg(long)]
    pub desc: bool,

    /// Tie-breaking sort key, optionally suffixed with `:desc`
    #[arg(long = "then-by", value_name = "KEY[:desc]", value_parser = parse_order)]
    pub then_by: Vec<OrderSpec>,

    /// Print at most N rows
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Reference day for relative date windows (default: local date)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub today: Option<NaiveDate>,

    /// Total the --sum field per value of this dimension
    #[arg(long, value_name = "DIM", requires = "sum")]
    pub group_by: Option<String>,

    /// Total the --sum field per calendar bucket (day, week, month, quarter, year)
    #[arg(long, value_name = "PERIOD", requires = "sum")]
    pub period: Option<Period>,

    /// Numeric field to total per group
    #[arg(long, value_name = "FIELD", requires = "grouping")]
    pub sum: Option<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Show verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned table with totals (default)
    #[default]
    Text,
    /// JSON object with rows, totals and groups
    Json,
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((dimension, value)) if !dimension.is_empty() => {
            Ok((dimension.to_string(), value.to_string()))
        }
        _ => Err(format!("expected DIM=VALUE, got {raw:?}")),
    }
}

fn parse_order(raw: &str) -> Result<OrderSpec, String> {
    let Some((key, direction)) = raw.rsplit_once(':') else {
        return Ok(OrderSpec::asc(raw));
    };
    let direction: SortDirection = direction
        .parse()
        .map_err(|e: QueryError| e.to_string())?;
    Ok(OrderSpec {
        key: key.to_string(),
        direction,
    })
}

/// Main entry point for the query command.
pub fn main() -> ExitCode {
    let args = Args::parse();

    if args.verbose {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_writer(io::stderr)
            .init();
    }

    let mut stdout = io::stdout().lock();
    match run(&args, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

/// Run the query described by `args`, writing the report to `writer`.
pub fn run<W: Write>(args: &Args, writer: &mut W) -> Result<()> {
    let schema = load_schema(args)?;
    let records = load_records(&args.file)?;
    check_records(&schema, &records)?;
    tracing::debug!(
        file = %args.file.display(),
        schema = %schema.name,
        records = records.len(),
        "loaded records"
    );

    let spec = build_spec(args);
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let result = Executor::new(&schema)
        .execute(&records, &spec, today)
        .context("failed to execute query")?;

    let summary = Summary::compute(&schema, &result, args).context("failed to aggregate")?;

    match args.format {
        OutputFormat::Text => write_text(&schema, &result, &summary, writer),
        OutputFormat::Json => write_json(&result, &summary, writer),
    }
}

fn load_schema(args: &Args) -> Result<Schema> {
    if let Some(path) = &args.schema_file {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read schema file {}", path.display()))?;
        return serde_json::from_str(&content)
            .with_context(|| format!("failed to parse schema file {}", path.display()));
    }

    let name = args.schema.as_deref().unwrap_or("general-ledger");
    Schema::preset(name).ok_or_else(|| {
        anyhow!(
            "unknown schema {name:?} (expected one of: {})",
            Schema::PRESETS.join(", ")
        )
    })
}

fn load_records(path: &Path) -> Result<Vec<Record>> {
    if !path.exists() {
        bail!("file not found: {}", path.display());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse records in {}", path.display()))
}

fn has_ledger_legs(schema: &Schema) -> bool {
    ["debit", "credit"]
        .iter()
        .all(|field| schema.field_type(field) == Ok(FieldType::Numeric))
}

fn check_records(schema: &Schema, records: &[Record]) -> Result<()> {
    let outcome = if has_ledger_legs(schema) {
        validate_ledger(records)
    } else {
        validate_records(records)
    };
    if let Err(errors) = outcome {
        let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
        bail!(
            "{} invalid record(s): {}",
            errors.len(),
            details.join("; ")
        );
    }
    Ok(())
}

fn build_spec(args: &Args) -> QuerySpec {
    let direction = if args.desc {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    };
    let mut spec = QuerySpec::new()
        .search(args.search.as_str())
        .date_range(args.date_range)
        .sort_by(args.sort.as_str(), direction);
    for (dimension, value) in &args.filters {
        spec = spec.filter(dimension.as_str(), value.as_str());
    }
    for order in &args.then_by {
        spec = spec.then_by(order.clone());
    }
    spec.limit = args.limit;
    spec
}

/// Totals printed under the rows.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary {
    matched: usize,
    returned: usize,
    totals: BTreeMap<String, Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    balance: Option<BalanceCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    groups: Option<GroupSums>,
}

#[derive(Debug, Serialize)]
struct GroupSums {
    by: String,
    field: String,
    sums: BTreeMap<String, Decimal>,
}

impl Summary {
    fn compute(schema: &Schema, result: &QueryResult<'_>, args: &Args) -> Result<Self, QueryError> {
        let rows = result.rows.as_slice();
        let totals = schema
            .fields
            .iter()
            .filter(|(_, def)| def.field_type == FieldType::Numeric)
            .map(|(name, _)| (name.clone(), sum_field(rows, name)))
            .collect();
        let balance = has_ledger_legs(schema).then(|| balance_check(rows));

        let aggregator = Aggregator::new(schema);
        let groups = match (&args.sum, &args.group_by, args.period) {
            (Some(field), Some(dimension), _) => Some(GroupSums {
                by: dimension.clone(),
                field: field.clone(),
                sums: aggregator
                    .aggregate_groups(rows, dimension, field)?
                    .into_iter()
                    .map(|(key, sum)| (key.unwrap_or_else(|| MISSING_GROUP.to_string()), sum))
                    .collect(),
            }),
            (Some(field), None, Some(period)) => Some(GroupSums {
                by: period.to_string(),
                field: field.clone(),
                sums: aggregator
                    .aggregate_periods(rows, period, field)?
                    .into_iter()
                    .map(|(start, sum)| (start.to_string(), sum))
                    .collect(),
            }),
            _ => None,
        };

        Ok(Self {
            matched: result.matched,
            returned: result.len(),
            totals,
            balance,
            groups,
        })
    }
}

/// Column order: id and date first, then the remaining declared fields.
fn columns(schema: &Schema) -> Vec<&str> {
    let lead = ["id", "date"]
        .into_iter()
        .filter(|name| schema.field(name).is_some());
    let rest = schema
        .fields
        .keys()
        .map(String::as_str)
        .filter(|name| *name != "id" && *name != "date");
    lead.chain(rest).collect()
}

fn cell(record: &Record, column: &str) -> String {
    record
        .get(column)
        .map(|value| value.as_text().into_owned())
        .unwrap_or_default()
}

fn write_text<W: Write>(
    schema: &Schema,
    result: &QueryResult<'_>,
    summary: &Summary,
    writer: &mut W,
) -> Result<()> {
    let columns = columns(schema);
    let cells: Vec<Vec<String>> = result
        .iter()
        .map(|record| columns.iter().map(|column| cell(record, column)).collect())
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
    for row in &cells {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.chars().count());
        }
    }

    // Header
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            write!(writer, "  ")?;
        }
        write!(writer, "{column:width$}", width = widths[i])?;
    }
    writeln!(writer)?;

    // Separator
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            write!(writer, "  ")?;
        }
        write!(writer, "{}", "-".repeat(*width))?;
    }
    writeln!(writer)?;

    for row in &cells {
        for (i, value) in row.iter().enumerate() {
            if i > 0 {
                write!(writer, "  ")?;
            }
            write!(writer, "{value:width$}", width = widths[i])?;
        }
        writeln!(writer)?;
    }

    writeln!(writer)?;
    if result.is_truncated() {
        writeln!(writer, "{} of {} row(s)", summary.returned, summary.matched)?;
    } else {
        writeln!(writer, "{} row(s)", summary.returned)?;
    }

    if !summary.totals.is_empty() {
        writeln!(writer, "Totals:")?;
        let width = summary.totals.keys().map(String::len).max().unwrap_or(0);
        for (field, total) in &summary.totals {
            writeln!(writer, "  {field:width$}  {total}")?;
        }
    }

    if let Some(check) = &summary.balance {
        if check.balanced {
            writeln!(
                writer,
                "Balance: balanced (debit {}, credit {})",
                check.debit_total, check.credit_total
            )?;
        } else {
            writeln!(
                writer,
                "Balance: UNBALANCED (debit {}, credit {}, difference {})",
                check.debit_total, check.credit_total, check.difference
            )?;
        }
    }

    if let Some(groups) = &summary.groups {
        writeln!(writer)?;
        writeln!(writer, "Sum of {} by {}:", groups.field, groups.by)?;
        let width = groups.sums.keys().map(|k| k.chars().count()).max().unwrap_or(0);
        for (key, sum) in &groups.sums {
            writeln!(writer, "  {key:width$}  {sum}")?;
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    rows: &'a [&'a Record],
    #[serde(flatten)]
    summary: &'a Summary,
}

fn write_json<W: Write>(result: &QueryResult<'_>, summary: &Summary, writer: &mut W) -> Result<()> {
    let output = JsonOutput {
        rows: &result.rows,
        summary,
    };
    writeln!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
    Ok(())
}
