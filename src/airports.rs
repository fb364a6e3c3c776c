//! Airport lookup table built from an OpenFlights-style `airports.dat`.

use std::collections::HashMap;
use std::path::Path;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::DatasetError;
use crate::geo::GeoPoint;

const MIN_FIELDS: usize = 8;
const NAME: usize = 1;
const CITY: usize = 2;
const IATA: usize = 4;
const LATITUDE: usize = 6;
const LONGITUDE: usize = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct Airport {
    pub code: String,
    pub name: String,
    pub city: String,
    pub position: GeoPoint,
}

#[derive(Debug, Default)]
pub struct AirportTable {
    airports: HashMap<String, Airport>,
}

impl AirportTable {
    /// Parse every usable row. Malformed rows are skipped, and a later row
    /// with the same code replaces an earlier one.
    pub fn parse(text: &str) -> Self {
        let mut airports = HashMap::new();
        let mut skipped = 0usize;

        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_row(line) {
                Some(airport) => {
                    airports.insert(airport.code.clone(), airport);
                }
                None => {
                    skipped += 1;
                    debug!(line = index + 1, "skipping airport row");
                }
            }
        }

        debug!(airports = airports.len(), skipped, "parsed airport dataset");
        Self { airports }
    }

    pub fn get(&self, code: &str) -> Option<&Airport> {
        self.airports.get(&code.trim().to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.airports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }
}

pub fn is_airport_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_alphabetic())
}

fn parse_row(line: &str) -> Option<Airport> {
    let fields = split_record(line);
    if fields.len() < MIN_FIELDS {
        return None;
    }

    let code = fields[IATA].trim();
    if !is_airport_code(code) {
        return None;
    }

    let latitude = fields[LATITUDE].trim().parse::<f64>().ok()?;
    let longitude = fields[LONGITUDE].trim().parse::<f64>().ok()?;
    let position = GeoPoint::new(latitude, longitude)?;

    Some(Airport {
        code: code.to_ascii_uppercase(),
        name: fields[NAME].clone(),
        city: fields[CITY].clone(),
        position,
    })
}

/// Split one CSV record. Quoted fields may contain commas; a doubled quote
/// inside a quoted field is a literal quote.
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.trim_end_matches('\r').chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            other => field.push(other),
        }
    }
    fields.push(field);
    fields
}

/// Load the dataset once from an http(s) URL or a local path.
pub async fn load(source: &str) -> Result<AirportTable, DatasetError> {
    let text = if source.starts_with("http://") || source.starts_with("https://") {
        let client = reqwest::Client::new();
        client
            .get(source)
            .header("User-Agent", concat!("dayline/", env!("CARGO_PKG_VERSION")))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?
    } else {
        tokio::fs::read_to_string(Path::new(source)).await?
    };

    let table = AirportTable::parse(&text);
    if table.is_empty() {
        return Err(DatasetError::Empty);
    }
    Ok(table)
}

/// Start the one-shot fetch. The receiver resolves exactly once.
pub fn spawn_load(source: String) -> oneshot::Receiver<Result<AirportTable, DatasetError>> {
    let (sender, receiver) = oneshot::channel();
    tokio::spawn(async move {
        info!(%source, "fetching airport dataset");
        let result = load(&source).await;
        if sender.send(result).is_err() {
            warn!("airport dataset finished after the app shut down");
        }
    });
    receiver
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"1,"Goroka Airport","Goroka","Papua New Guinea","GKA","AYGA",-6.081689834590001,145.391998291,5282,10,"U","Pacific/Port_Moresby","airport","OurAirports"
3484,"Los Angeles International Airport","Los Angeles","United States","LAX","KLAX",33.94250107,-118.4079971,125,-8,"A","America/Los_Angeles","airport","OurAirports"
3797,"John F Kennedy International Airport","New York","United States","JFK","KJFK",40.63980103,-73.77890015,13,-5,"A","America/New_York","airport","OurAirports"
2279,"Narita International Airport","Tokyo","Japan","NRT","RJAA",35.7647018433,140.386001587,141,9,"U","Asia/Tokyo","airport","OurAirports"
"#;

    #[test]
    fn parses_openflights_rows() {
        let table = AirportTable::parse(SAMPLE);
        assert_eq!(table.len(), 4);

        let jfk = table.get("JFK").unwrap();
        assert_eq!(jfk.name, "John F Kennedy International Airport");
        assert_eq!(jfk.city, "New York");
        assert!((jfk.position.latitude() - 40.63980103).abs() < 1e-9);
        assert!((jfk.position.longitude() + 73.77890015).abs() < 1e-9);
    }

    #[test]
    fn lookup_ignores_case_and_whitespace() {
        let table = AirportTable::parse(SAMPLE);
        assert_eq!(table.get(" nrt ").map(|a| a.code.as_str()), Some("NRT"));
        assert!(table.get("XXX").is_none());
    }

    #[test]
    fn malformed_rows_do_not_abort_the_parse() {
        let text = [
            r#"1,"Short Row","Nowhere","Land","AAA","ZZZZ",1.0"#,
            r#"2,"No Code","Somewhere","Land",\N,"ZZZZ",10.0,20.0,0"#,
            r#"3,"Long Code","Somewhere","Land","ABCD","ZZZZ",10.0,20.0,0"#,
            r#"4,"Digits","Somewhere","Land","A1B","ZZZZ",10.0,20.0,0"#,
            r#"5,"Bad Latitude","Somewhere","Land","BAD","ZZZZ",north,20.0,0"#,
            r#"6,"Off The Map","Somewhere","Land","OFF","ZZZZ",95.0,20.0,0"#,
            "",
            r#"7,"Good","Somewhere","Land","GUD","ZZZZ",10.0,20.0,0"#,
        ]
        .join("\n");

        let table = AirportTable::parse(&text);
        assert_eq!(table.len(), 1);
        assert!(table.get("GUD").is_some());
    }

    #[test]
    fn later_duplicates_win() {
        let text = "1,\"Old\",\"A\",\"X\",\"DUP\",\"ZZZZ\",1.0,2.0\n\
                    2,\"New\",\"B\",\"X\",\"DUP\",\"ZZZZ\",3.0,4.0\n";
        let table = AirportTable::parse(text);
        assert_eq!(table.len(), 1);
        let dup = table.get("DUP").unwrap();
        assert_eq!(dup.name, "New");
        assert_eq!(dup.position.latitude(), 3.0);
    }

    #[test]
    fn quoted_commas_and_quotes_stay_in_one_field() {
        let fields = split_record(r#"9,"Washington, Dulles","He said ""hi""","US","IAD""#);
        assert_eq!(
            fields,
            vec!["9", "Washington, Dulles", r#"He said "hi""#, "US", "IAD"]
        );
    }

    #[test]
    fn lowercase_codes_are_normalized() {
        let table = AirportTable::parse("1,\"Tiny\",\"Town\",\"X\",\"abc\",\"ZZZZ\",1.0,2.0\r\n");
        assert_eq!(table.get("ABC").map(|a| a.city.as_str()), Some("Town"));
    }

    #[tokio::test]
    async fn loads_from_a_local_file() {
        let path = std::env::temp_dir().join(format!("dayline-airports-{}.dat", std::process::id()));
        tokio::fs::write(&path, SAMPLE).await.unwrap();

        let table = load(path.to_str().unwrap()).await.unwrap();
        assert_eq!(table.len(), 4);

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let result = load("/definitely/not/here/airports.dat").await;
        assert!(matches!(result, Err(DatasetError::Read(_))));
    }

    #[tokio::test]
    async fn empty_dataset_is_reported() {
        let path = std::env::temp_dir().join(format!("dayline-empty-{}.dat", std::process::id()));
        tokio::fs::write(&path, "not,a,real,dataset\n").await.unwrap();

        let result = spawn_load(path.to_str().unwrap().to_string()).await.unwrap();
        assert!(matches!(result, Err(DatasetError::Empty)));

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
