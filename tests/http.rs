use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

const SCENARIO_CSV: &str = "\
Sıra No,Tarih,Plaka No,İsim,Kabahat,Ceza Miktarı,Ceza Türü,Ceza Detay
1,2024-01-10,34AB123,Ayşe Yılmaz,Hız İhlali,500,para,
2,2024-01-22,06CD456,Mehmet Kaya,Hız İhlali,500,para,
3,2024-02-03,35EF789,Zeynep Demir,Hız İhlali,500,para,
4,2024-02-14,34AB123,Ayşe Yılmaz,Park İhlali,0,men,7 gün men
5,,16GH012,Can Öz,Park İhlali,0,men,
";

#[derive(Debug, Deserialize)]
struct Summary {
    count: usize,
    total: f64,
    average: f64,
}

#[derive(Debug, Deserialize)]
struct ParetoEntry {
    category: String,
    count: usize,
    percentage: f64,
    cumulative_percentage: f64,
}

#[derive(Debug, Deserialize)]
struct PlateEntry {
    plate: String,
    total: f64,
    count: usize,
    average: f64,
}

#[derive(Debug, Deserialize)]
struct DashboardView {
    status: String,
    loading: bool,
    message: Option<String>,
    record_count: Option<usize>,
    suspension_count: Option<usize>,
    summary: Option<Summary>,
    #[serde(default)]
    pareto: Vec<ParetoEntry>,
    #[serde(default)]
    top_plates: Vec<PlateEntry>,
}

#[derive(Debug, Deserialize)]
struct Record {
    sequence: i64,
    suspension: bool,
    penalty: String,
}

#[derive(Debug, Deserialize, PartialEq)]
struct AppliedSort {
    field: String,
    dir: String,
}

#[derive(Debug, Deserialize)]
struct RecordsResponse {
    total_count: usize,
    filtered_count: usize,
    summary: Summary,
    sort: Option<AppliedSort>,
    records: Vec<Record>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    total_rows: usize,
    imported: usize,
    skipped: usize,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::Once;
    use std::sync::atomic::{AtomicI32, Ordering};

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("varaka_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/dashboard")).send().await {
            if resp.status().is_success() {
                let view: DashboardView = resp.json().await.unwrap();
                if view.status != "loading" {
                    return;
                }
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_varaka_dashboard"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("REFETCH_DEBOUNCE_MS", "20")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    let base_url = format!("http://127.0.0.1:{port}");
    let server = TestServer { base_url, child };
    wait_until_ready(&server.base_url).await;
    server
}

async fn upload(client: &Client, base_url: &str, csv: &str) -> reqwest::Response {
    client
        .post(format!("{base_url}/api/upload"))
        .body(csv.to_string())
        .send()
        .await
        .unwrap()
}

/// One server seeded with the five-record scenario, shared by read-only tests.
async fn seeded_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = spawn_server().await;
    #[cfg(unix)]
    cleanup::register(server.child.id());

    let response = upload(&Client::new(), &server.base_url, SCENARIO_CSV).await;
    assert!(response.status().is_success());

    let server = Arc::new(server);
    *guard = Some(Arc::clone(&server));
    server
}

async fn dashboard(client: &Client, base_url: &str) -> DashboardView {
    client
        .get(format!("{base_url}/api/dashboard"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_empty_store_reports_missing_data_then_accepts_upload() {
    let server = spawn_server().await;
    let client = Client::new();

    let view = dashboard(&client, &server.base_url).await;
    assert_eq!(view.status, "error");
    assert!(!view.loading);
    assert!(view.message.unwrap().contains("Henüz veri yüklenmemiş"));

    let records = client
        .get(format!("{}/api/records", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(records.status().as_u16(), 503);

    let bad = upload(&client, &server.base_url, "plate,category\n,\n").await;
    assert_eq!(bad.status().as_u16(), 400);

    let response = upload(&client, &server.base_url, SCENARIO_CSV).await;
    assert!(response.status().is_success());
    let report: UploadResponse = response.json().await.unwrap();
    assert_eq!(report.total_rows, 5);
    assert_eq!(report.imported, 5);
    assert_eq!(report.skipped, 0);

    let view = dashboard(&client, &server.base_url).await;
    assert_eq!(view.status, "ready");
    assert_eq!(view.record_count, Some(5));
}

#[tokio::test]
async fn http_dashboard_aggregates_scenario() {
    let server = seeded_server().await;
    let client = Client::new();

    let view = dashboard(&client, &server.base_url).await;
    assert_eq!(view.status, "ready");
    assert_eq!(view.suspension_count, Some(2));

    let summary = view.summary.unwrap();
    assert_eq!(summary.count, 5);
    assert_eq!(summary.total, 1500.0);
    assert_eq!(summary.average, 300.0);

    assert_eq!(view.pareto.len(), 2);
    assert_eq!(view.pareto[0].category, "Hız İhlali");
    assert_eq!(view.pareto[0].count, 3);
    assert!((view.pareto[0].percentage - 60.0).abs() < 1e-9);
    assert!((view.pareto[1].cumulative_percentage - 100.0).abs() < 1e-9);

    let shared = view
        .top_plates
        .iter()
        .find(|entry| entry.plate == "34AB123")
        .expect("missing shared plate");
    assert_eq!(shared.total, 500.0);
    assert_eq!(shared.count, 2);
    assert_eq!(shared.average, 250.0);
}

#[tokio::test]
async fn http_records_filter_and_sort() {
    let server = seeded_server().await;
    let client = Client::new();

    let filtered: RecordsResponse = client
        .get(format!(
            "{}/api/records?kind=men&sort=sequence&dir=desc",
            server.base_url
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(filtered.total_count, 5);
    assert_eq!(filtered.filtered_count, 2);
    assert_eq!(filtered.summary.total, 0.0);
    let order: Vec<i64> = filtered.records.iter().map(|r| r.sequence).collect();
    assert_eq!(order, vec![5, 4]);
    assert!(filtered.records.iter().all(|r| r.suspension));
    assert_eq!(filtered.records[0].penalty, "Men Cezası");
    assert_eq!(filtered.records[1].penalty, "7 gün men");
    assert_eq!(
        filtered.sort,
        Some(AppliedSort {
            field: "sequence".to_string(),
            dir: "desc".to_string(),
        })
    );

    let toggled: RecordsResponse = client
        .get(format!(
            "{}/api/records?sort=date&dir=asc&toggle=date",
            server.base_url
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let order: Vec<i64> = toggled.records.iter().map(|r| r.sequence).collect();
    assert_eq!(order, vec![4, 3, 2, 1, 5]);
    assert_eq!(toggled.sort.unwrap().dir, "desc");
    assert!(!toggled.records[3].suspension);
    assert_eq!(toggled.records[3].penalty, "500 ₺");

    let ranged: RecordsResponse = client
        .get(format!(
            "{}/api/records?start=2024-01-01&end=2024-01-31",
            server.base_url
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let order: Vec<i64> = ranged.records.iter().map(|r| r.sequence).collect();
    assert_eq!(order, vec![1, 2]);
}

#[tokio::test]
async fn http_exports_filtered_table() {
    let server = seeded_server().await;
    let client = Client::new();

    let csv = client
        .get(format!("{}/api/export/csv?search=hız", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(csv.status().is_success());
    let content_type = csv.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/csv"));
    let body = csv.text().await.unwrap();
    assert_eq!(body.lines().count(), 4);

    let report = client
        .get(format!("{}/api/export/report", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(report.contains("Varaka Detay Listesi"));
    assert!(report.contains("Sayfa 1 / 1"));
}
