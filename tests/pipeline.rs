use covid_forecast::config::Sources;
use covid_forecast::models::SeriesType;
use covid_forecast::services::aggregate::parse_table;
use covid_forecast::{run, run_with_tables, Config, PipelineError};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const HEADER: &str = "Province/State,Country/Region,Lat,Long";

fn csv(dates: &[&str], rows: &[(&str, &str, Vec<f64>)]) -> String {
    let mut text = format!("{},{}\n", HEADER, dates.join(","));
    for (province, country, values) in rows {
        let cells: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        text.push_str(&format!(
            "{},{},10.0,20.0,{}\n",
            province,
            country,
            cells.join(",")
        ));
    }
    text
}

struct Fixture {
    _dir: TempDir,
    config: Config,
}

impl Fixture {
    fn new(confirmed: &str, deaths: &str, recovered: &str) -> Self {
        let dir = tempdir().unwrap();
        let write = |name: &str, body: &str| -> String {
            let path = dir.path().join(name);
            fs::write(&path, body).unwrap();
            path.to_str().unwrap().to_string()
        };
        let sources = Sources {
            confirmed: write("confirmed.csv", confirmed),
            deaths: write("deaths.csv", deaths),
            recovered: write("recovered.csv", recovered),
        };
        let config = Config {
            sources,
            data_dir: dir.path().join("data"),
            ..Config::default()
        };
        Fixture { _dir: dir, config }
    }

    fn out(&self) -> &Path {
        &self.config.data_dir
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.out().join(rel)
    }
}

fn read_values(path: &Path) -> Vec<f64> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| l.parse::<f64>().unwrap())
        .collect()
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn single_country_series_are_written() {
    let dates = ["1/22/20", "1/23/20", "1/24/20"];
    let fx = Fixture::new(
        &csv(&dates, &[("", "X", vec![1.0, 3.0, 6.0])]),
        &csv(&dates, &[("", "X", vec![0.0, 1.0, 1.0])]),
        &csv(&dates, &[("", "X", vec![0.0, 0.0, 2.0])]),
    );

    let summary = run(&fx.config).await.unwrap();
    assert_eq!(summary.countries, 1);
    assert_eq!(summary.fits, 6);

    assert_eq!(read_values(&fx.path("X/cumulative_total")), vec![1.0, 3.0, 6.0]);
    assert_eq!(read_values(&fx.path("X/incident_total")), vec![1.0, 2.0, 3.0]);
    assert_eq!(read_values(&fx.path("X/incident_death")), vec![0.0, 1.0, 0.0]);
    assert_eq!(read_values(&fx.path("X/incident_recovered")), vec![0.0, 0.0, 2.0]);
    assert_eq!(read_lines(&fx.path("dates")), dates);
}

#[tokio::test]
async fn sub_regions_are_summed() {
    let dates = ["1/22/20", "1/23/20"];
    let body = csv(
        &dates,
        &[("North", "Y", vec![1.0, 2.0]), ("South", "Y", vec![3.0, 4.0])],
    );
    let fx = Fixture::new(&body, &body, &body);

    run(&fx.config).await.unwrap();
    assert_eq!(read_values(&fx.path("Y/cumulative_total")), vec![4.0, 6.0]);
    assert_eq!(read_values(&fx.path("Y/cumulative_recovered")), vec![4.0, 6.0]);
}

#[tokio::test]
async fn countries_listed_once_in_first_seen_order() {
    let dates = ["1/22/20", "1/23/20"];
    let body = csv(
        &dates,
        &[
            ("", "Zambia", vec![1.0, 2.0]),
            ("A", "Canada", vec![1.0, 1.0]),
            ("B", "Canada", vec![2.0, 2.0]),
            ("", "Albania", vec![0.0, 5.0]),
            ("C", "Canada", vec![3.0, 3.0]),
        ],
    );
    let fx = Fixture::new(&body, &body, &body);

    run(&fx.config).await.unwrap();
    assert_eq!(
        read_lines(&fx.path("countries")),
        vec!["Zambia", "Canada", "Albania"]
    );
    assert_eq!(read_values(&fx.path("Canada/cumulative_total")), vec![6.0, 6.0]);
}

#[tokio::test]
async fn forecasts_always_cover_sixty_days() {
    let dates = ["3/1/20", "3/2/20"];
    let body = csv(&dates, &[("", "X", vec![10.0, 12.0]), ("", "W", vec![0.0, 0.0])]);
    let fx = Fixture::new(&body, &body, &body);

    run(&fx.config).await.unwrap();
    for country in ["X", "W"] {
        for kind in SeriesType::ALL {
            let path = fx.path(&format!("{}/{}", country, kind.predicted_file_name()));
            assert_eq!(read_values(&path).len(), 60, "{}", path.display());
        }
    }

    let predicted_dates = read_lines(&fx.path("predicted_dates"));
    assert_eq!(predicted_dates.len(), 60);
    assert_eq!(predicted_dates[0], "03/03/20");
    assert_eq!(predicted_dates[59], "05/01/20");
}

#[tokio::test]
async fn raw_outputs_are_reproducible() {
    let dates: Vec<String> = (1..=30).map(|d| format!("4/{}/20", d)).collect();
    let date_refs: Vec<&str> = dates.iter().map(String::as_str).collect();
    let values: Vec<f64> = (0..30).map(|i| (i * i) as f64).collect();
    let body = csv(&date_refs, &[("", "X", values)]);
    let fx = Fixture::new(&body, &body, &body);

    run(&fx.config).await.unwrap();
    let first_raw = fs::read(fx.path("X/incident_total")).unwrap();
    let first_predicted = fs::read(fx.path("X/predicted_incident_total")).unwrap();

    // second run over an existing tree
    run(&fx.config).await.unwrap();
    assert_eq!(fs::read(fx.path("X/incident_total")).unwrap(), first_raw);
    assert_eq!(
        fs::read(fx.path("X/predicted_incident_total")).unwrap(),
        first_predicted
    );
}

#[tokio::test]
async fn json_export_is_optional() {
    let dates = ["1/22/20", "1/23/20", "1/24/20"];
    let body = csv(&dates, &[("", "X", vec![1.0, 3.0, 6.0])]);
    let mut fx = Fixture::new(&body, &body, &body);

    run(&fx.config).await.unwrap();
    assert!(!fx.path("X/forecast.json").exists());

    fx.config.export_json = true;
    fx.config.horizon = 7;
    run(&fx.config).await.unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(fx.path("X/forecast.json")).unwrap()).unwrap();
    assert_eq!(json["country"], "X");
    assert_eq!(json["series"].as_array().unwrap().len(), 6);
    assert_eq!(json["series"][3]["series"], "incident_total");
    assert_eq!(json["series"][3]["values"][2], 3.0);
    assert_eq!(json["series"][3]["predicted"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn missing_country_in_deaths_aborts() {
    let dates = ["1/22/20", "1/23/20"];
    let fx = Fixture::new(
        &csv(&dates, &[("", "X", vec![1.0, 2.0]), ("", "Q", vec![1.0, 2.0])]),
        &csv(&dates, &[("", "X", vec![0.0, 0.0])]),
        &csv(&dates, &[("", "X", vec![0.0, 0.0]), ("", "Q", vec![1.0, 2.0])]),
    );

    let err = run(&fx.config).await.unwrap_err();
    assert!(matches!(err, PipelineError::ShapeMismatch(_)));
    assert!(!fx.path("countries").exists());
}

#[tokio::test]
async fn malformed_source_aborts_before_writing() {
    let good = csv(&["1/22/20", "1/23/20"], &[("", "X", vec![1.0, 2.0])]);
    let fx = Fixture::new(&good, "Country,1/22/20\nX,1\n", &good);

    let err = run(&fx.config).await.unwrap_err();
    assert!(matches!(err, PipelineError::MalformedSource(_)));
    assert!(!fx.out().exists());
}

#[test]
fn single_date_history_cannot_be_forecast() {
    let body = csv(&["1/22/20"], &[("", "X", vec![1.0])]);
    let table = parse_table(&body).unwrap();
    let dir = tempdir().unwrap();
    let config = Config {
        data_dir: dir.path().to_path_buf(),
        ..Config::default()
    };

    let err = run_with_tables(&table, &table, &table, &config).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::InsufficientData { needed: 2, got: 1 }
    ));
}
