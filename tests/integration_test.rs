use async_trait::async_trait;
use math_problem_client::error::AppError;
use math_problem_client::models::{
    AnalyzeRequest, AnalyzeResponse, DownloadRequest, GenerateRequest, GenerateResponse,
    GeneratedSet,
};
use math_problem_client::orchestrator::ProcessingStats;
use math_problem_client::{
    logger, AnalysisView, ApiClient, App, AppResult, Completion, Config, Difficulty,
    DownloadFormat, DownloadWriter, GeneratedView, GenerationSettings, Operation, Phase,
    ProblemApi, Session,
};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_test::assert_ok;

// ========== 内存中的后端 ==========

#[derive(Default)]
struct FakeState {
    analyze_calls: AtomicUsize,
    generate_calls: AtomicUsize,
    download_calls: AtomicUsize,
    last_generate: Mutex<Option<Value>>,
    reject_generate: bool,
    fail_downloads: bool,
}

/// 按例题文本决定响应的后端
///
/// - 含 `FAIL`：`success: false`
/// - 含 `slow`：延迟 150ms 后返回学年 `旧`
/// - 其余：学年 `中3`，不回显原题
#[derive(Clone, Default)]
struct FakeApi {
    state: Arc<FakeState>,
}

impl FakeApi {
    fn with(reject_generate: bool, fail_downloads: bool) -> Self {
        Self {
            state: Arc::new(FakeState {
                reject_generate,
                fail_downloads,
                ..Default::default()
            }),
        }
    }

    fn calls(&self) -> (usize, usize, usize) {
        (
            self.state.analyze_calls.load(Ordering::SeqCst),
            self.state.generate_calls.load(Ordering::SeqCst),
            self.state.download_calls.load(Ordering::SeqCst),
        )
    }

    fn last_generate(&self) -> Value {
        self.state.last_generate.lock().unwrap().clone().unwrap()
    }
}

#[async_trait]
impl ProblemApi for FakeApi {
    async fn analyze(&self, request: &AnalyzeRequest) -> AppResult<AnalyzeResponse> {
        self.state.analyze_calls.fetch_add(1, Ordering::SeqCst);
        let text = &request.problem_text;

        let body = if text.contains("FAIL") {
            json!({"success": false, "error": "解析できません"})
        } else if text.contains("slow") {
            tokio::time::sleep(Duration::from_millis(150)).await;
            json!({"success": true, "analysis": {"grade": "旧"}})
        } else {
            json!({
                "success": true,
                "analysis": {
                    "grade": "中3",
                    "unit": "二次方程式",
                    "difficulty": "標準",
                    "summary": "判別式 $D=b^2-4ac$ を使う",
                    "topic": "判別式"
                },
                "raw_response": {"model": "fake"}
            })
        };
        serde_json::from_value(body).map_err(|e| AppError::json_parse_failed(Operation::Analyze, e))
    }

    async fn generate(&self, request: &GenerateRequest) -> AppResult<GenerateResponse> {
        self.state.generate_calls.fetch_add(1, Ordering::SeqCst);
        *self.state.last_generate.lock().unwrap() = Some(serde_json::to_value(request).unwrap());

        let body = if self.state.reject_generate {
            json!({"success": false, "error": "生成できません"})
        } else {
            json!({
                "problems": [{
                    "title": "類題",
                    "problem": "$x^2+2x+3=0$ を解け",
                    "answer": "実数解なし",
                    "explanation": "判別式 $D=4-12<0$"
                }],
                "metadata": {"grade": "中3", "difficulty": request.difficulty.label()}
            })
        };
        serde_json::from_value(body).map_err(|e| AppError::json_parse_failed(Operation::Generate, e))
    }

    async fn download(
        &self,
        format: DownloadFormat,
        _request: &DownloadRequest,
    ) -> AppResult<Vec<u8>> {
        self.state.download_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_downloads {
            return Err(AppError::bad_status(format.operation(), 500));
        }
        Ok(format!("fake {}", format).into_bytes())
    }
}

fn session(api: FakeApi, output_dir: &Path) -> Session<FakeApi> {
    Session::new(api, DownloadWriter::new(output_dir))
}

// ========== Session ==========

#[tokio::test]
async fn test_end_to_end_analyze_generate_download() {
    logger::init(false);
    let dir = tempfile::tempdir().unwrap();
    let session = session(FakeApi::default(), dir.path());

    let analysis = assert_ok!(session.analyze("x^2+x+1=0 を解け").await)
        .applied()
        .unwrap();
    assert_eq!(analysis.grade.as_deref(), Some("中3"));
    assert!(AnalysisView::new(&analysis).to_string().contains("学年: 中3"));
    assert_eq!(session.snapshot().phase(), Phase::Analyzed);

    let settings = GenerationSettings {
        difficulty: Difficulty::Level2,
        count: 3,
        solution_hint: String::new(),
    };
    let set = assert_ok!(session.generate(&settings).await).applied().unwrap();
    assert_eq!(session.snapshot().phase(), Phase::Generated);

    let view = GeneratedView::new(&set, Some(&analysis), &settings);
    assert_eq!(view.difficulty, "Level 2 (標準)");
    assert_eq!(view.problems().len(), 1);
    assert!(view.problems()[0].answer.is_some());
    assert!(view.to_string().contains("■ 問題1：類題"));
    assert!(view.to_string().contains("  解答\n    実数解なし"));

    let path = assert_ok!(session.download(DownloadFormat::Pdf).await).unwrap();
    assert_eq!(path, dir.path().join("math_problems.pdf"));
    assert_eq!(std::fs::read(&path).unwrap(), b"fake PDF");
}

#[tokio::test]
async fn test_original_problem_falls_back_to_trimmed_input() {
    let dir = tempfile::tempdir().unwrap();
    let session = session(FakeApi::default(), dir.path());

    let analysis = session
        .analyze("  2x+1=5 を解け \n")
        .await
        .unwrap()
        .applied()
        .unwrap();
    assert_eq!(analysis.original_problem, "2x+1=5 を解け");
    assert_eq!(analysis.raw_response, Some(json!({"model": "fake"})));
}

#[tokio::test]
async fn test_generate_request_payload() {
    let dir = tempfile::tempdir().unwrap();
    let api = FakeApi::default();
    let session = session(api.clone(), dir.path());

    session.analyze("x^2=4").await.unwrap();
    let settings = GenerationSettings {
        difficulty: Difficulty::Level5,
        count: 0,
        solution_hint: "因数分解".to_string(),
    };
    session.generate(&settings).await.unwrap();

    let sent = api.last_generate();
    assert_eq!(sent["count"], json!(1));
    assert_eq!(sent["difficulty"], json!("Level 5 (最難関)"));
    assert_eq!(sent["original_problem"], json!("x^2=4"));
    assert_eq!(sent["solution_hint"], json!("因数分解"));
    assert_eq!(sent["analysis_summary"], json!("判別式 $D=b^2-4ac$ を使う"));
    // 服务端返回的额外字段原样回传
    assert_eq!(sent["analysis"]["topic"], json!("判別式"));
}

#[tokio::test]
async fn test_stale_analyze_response_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let session = session(FakeApi::default(), dir.path());

    let (older, newer) = tokio::join!(session.analyze("slow"), session.analyze("x+1=0"));

    assert_eq!(older.unwrap(), Completion::Superseded);
    assert!(matches!(newer.unwrap(), Completion::Applied(_)));
    let store = session.snapshot();
    assert_eq!(store.analysis().unwrap().grade.as_deref(), Some("中3"));
    assert!(!store.is_analyzing());
}

#[tokio::test]
async fn test_rejected_generate_keeps_previous_state() {
    let dir = tempfile::tempdir().unwrap();
    let api = FakeApi::with(true, false);
    let session = session(api.clone(), dir.path());

    session.analyze("x^2=9").await.unwrap();
    let err = session
        .generate(&GenerationSettings::default())
        .await
        .unwrap_err();

    assert_eq!(
        err.alert_message(Operation::Generate),
        "類題生成中にエラーが発生しました: 生成できません"
    );
    let store = session.snapshot();
    assert!(store.generated().is_none());
    assert_eq!(store.phase(), Phase::Analyzed);
    assert_eq!(store.generate_label(), "類題を生成");
}

#[tokio::test]
async fn test_download_failure_saves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let api = FakeApi::with(false, true);
    let session = session(api.clone(), dir.path());

    session.analyze("x^2=9").await.unwrap();
    session.generate(&GenerationSettings::default()).await.unwrap();
    let before = session.snapshot().generated().cloned();

    let err = session.download(DownloadFormat::Word).await.unwrap_err();
    assert_eq!(
        err.alert_message(Operation::DownloadWord),
        "Word生成中にエラーが発生しました: Word生成に失敗しました (HTTP 500)"
    );
    assert!(!dir.path().join("math_problems.docx").exists());
    assert_eq!(session.snapshot().generated().cloned(), before);
    assert_eq!(api.calls(), (1, 1, 1));
}

#[tokio::test]
async fn test_blank_input_never_reaches_backend() {
    let dir = tempfile::tempdir().unwrap();
    let api = FakeApi::default();
    let session = session(api.clone(), dir.path());

    assert!(session.analyze("").await.unwrap_err().is_validation());
    assert!(session.analyze("   ").await.unwrap_err().is_validation());
    assert!(session
        .generate(&GenerationSettings::default())
        .await
        .unwrap_err()
        .is_validation());
    assert_eq!(api.calls(), (0, 0, 0));
}

// ========== ApiClient ==========

/// 只应答一次的本地 HTTP 服务，返回 API 基础路径
async fn serve_once(status: u16, content_type: &'static str, body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            if request_complete(&request) {
                break;
            }
        }

        let head = format!(
            "HTTP/1.1 {} X\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            content_type,
            body.len()
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(&body).await.unwrap();
        socket.shutdown().await.ok();
    });

    format!("http://{}/api", addr)
}

fn request_complete(request: &[u8]) -> bool {
    let text = String::from_utf8_lossy(request);
    let Some(header_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let content_length = text[..header_end]
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    request.len() >= header_end + 4 + content_length
}

fn client_for(base_url: String) -> ApiClient {
    let config = Config {
        api_base_url: base_url,
        request_timeout_secs: 5,
        ..Config::default()
    };
    ApiClient::new(&config).unwrap()
}

#[tokio::test]
async fn test_api_client_bad_status() {
    let base = serve_once(500, "application/json", b"{}".to_vec()).await;
    let client = client_for(base);

    let err = client
        .analyze(&AnalyzeRequest {
            problem_text: "x=1".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(
        err.alert_message(Operation::Analyze),
        "解析中にエラーが発生しました: 解析に失敗しました (HTTP 500)"
    );
}

#[tokio::test]
async fn test_api_client_parses_string_analysis() {
    let body = json!({"success": true, "analysis": "LLM の生出力", "original_problem": "x=1"});
    let base = serve_once(200, "application/json", body.to_string().into_bytes()).await;
    let client = client_for(base.clone());
    let session = Session::new(client, DownloadWriter::new("unused"));

    let analysis = session.analyze("x = 1").await.unwrap().applied().unwrap();
    assert_eq!(analysis.summary.as_deref(), Some("LLM の生出力"));
    assert_eq!(analysis.original_problem, "x=1");
    assert_eq!(analysis.grade, None);
}

#[tokio::test]
async fn test_api_client_download_bytes() {
    let base = serve_once(200, "application/pdf", b"%PDF-1.7 test".to_vec()).await;
    let client = client_for(base);

    let request = DownloadRequest::from(&GeneratedSet::default());
    let bytes = client.download(DownloadFormat::Pdf, &request).await.unwrap();
    assert_eq!(bytes, b"%PDF-1.7 test");
}

#[tokio::test]
async fn test_api_client_invalid_json() {
    let base = serve_once(200, "application/json", b"<html>".to_vec()).await;
    let client = client_for(base);

    let err = client
        .analyze(&AnalyzeRequest {
            problem_text: "x=1".to_string(),
        })
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("JSON解析失败 (/analyze)"));
}

#[tokio::test]
async fn test_api_client_truthy_success_with_numeric_grade() {
    let body = json!({"success": 1, "analysis": {"grade": 3, "unit": "比例"}});
    let base = serve_once(200, "application/json", body.to_string().into_bytes()).await;
    let session = Session::new(client_for(base), DownloadWriter::new("unused"));

    let analysis = session.analyze("y=3x").await.unwrap().applied().unwrap();
    assert_eq!(analysis.grade.as_deref(), Some("3"));
    assert_eq!(AnalysisView::new(&analysis).grade, "3");
}

#[tokio::test]
async fn test_api_client_null_success_is_rejected() {
    for flag in [json!(null), json!(0)] {
        let body = json!({"success": flag, "analysis": {"grade": "中1"}});
        let base = serve_once(200, "application/json", body.to_string().into_bytes()).await;
        let session = Session::new(client_for(base), DownloadWriter::new("unused"));

        let err = session.analyze("x+1=2").await.unwrap_err();
        assert_eq!(
            err.alert_message(Operation::Analyze),
            "解析中にエラーが発生しました: 解析結果を取得できませんでした"
        );
        assert!(session.snapshot().analysis().is_none());
    }
}

#[tokio::test]
async fn test_numeric_answer_is_shown_and_sent_back() {
    let body = json!({
        "success": true,
        "problems": [{"problem": "1+2 を計算せよ", "answer": 3, "explanation": null}],
        "metadata": {"difficulty": 2}
    });
    let response: GenerateResponse = serde_json::from_value(body).unwrap();

    let view = GeneratedView::new(&response.set, None, &GenerationSettings::default());
    let blocks = view.problems();
    assert_eq!(blocks.len(), 1);
    assert_eq!(
        blocks[0].to_string(),
        "■ 問題1\n    1+2 を計算せよ\n\n  解答\n    3"
    );
    assert_eq!(view.difficulty, "2");

    let request = serde_json::to_value(DownloadRequest::from(&response.set)).unwrap();
    assert_eq!(
        request["problems"],
        json!([{"problem": "1+2 を計算せよ", "answer": 3, "explanation": null}])
    );
}

// ========== 批量处理 ==========

#[tokio::test]
async fn test_batch_run_processes_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let jobs_dir = dir.path().join("jobs");
    std::fs::create_dir_all(&jobs_dir).unwrap();
    std::fs::write(
        jobs_dir.join("a.toml"),
        "name = \"二次方程式 A\"\nproblem_text = \"x^2+x+1=0 を解け\"\ndifficulty = \"2\"\ncount = 2\nformats = [\"pdf\", \"word\"]\n",
    )
    .unwrap();
    std::fs::write(
        jobs_dir.join("b.toml"),
        "name = \"失敗する例\"\nproblem_text = \"FAIL\"\n",
    )
    .unwrap();
    std::fs::write(jobs_dir.join("c.toml"), "name = \"空\"\nproblem_text = \"\"\n").unwrap();

    let log_file = dir.path().join("batch_log.txt");
    let config = Config {
        output_dir: dir.path().join("out").to_string_lossy().to_string(),
        jobs_folder: jobs_dir.to_string_lossy().to_string(),
        output_log_file: log_file.to_string_lossy().to_string(),
        max_concurrent_jobs: 2,
        ..Config::default()
    };

    let api = FakeApi::default();
    let stats = App::with_api(config, api.clone()).run().await.unwrap();

    assert_eq!(
        stats,
        ProcessingStats {
            success: 1,
            failed: 1,
            total: 2
        }
    );
    let job_dir = dir.path().join("out").join("二次方程式 A");
    assert!(job_dir.join("problems.txt").exists());
    assert!(job_dir.join("math_problems.pdf").exists());
    assert!(job_dir.join("math_problems.docx").exists());
    assert_eq!(api.calls(), (2, 1, 2));

    let summary = std::fs::read_to_string(job_dir.join("problems.txt")).unwrap();
    assert!(summary.contains("生成難易度: Level 2 (標準)"));

    let log = std::fs::read_to_string(&log_file).unwrap();
    assert!(log.contains("✓ 二次方程式 A - 1 道类题"));
    assert!(log.contains("✗ 失敗する例"));
    assert!(log.contains("合计: 成功 1/2, 失败 1"));
}
