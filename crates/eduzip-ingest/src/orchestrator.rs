use eduzip_ai::{build_chat_request, extract_from_response, parse_reply};
use eduzip_client::DocumentService;
use eduzip_core::wire::ChatCompletion;
use eduzip_core::{
    AnalysisMode, ChecklistRecord, ParseResponse, PipelineConfig, RawExchange, UploadedFile,
    UpstageConfig,
};
use eduzip_store::{ResultStore, Session};
use tracing::{info, warn};

use crate::{FileError, FileState, IngestError, IngestEvent, LogEntry, LogLevel};

/// Final state of one file in a batch.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub file: String,
    pub state: FileState,
    /// Rows this file contributed to the result store.
    pub rows: usize,
    pub error: Option<String>,
}

/// Summary of a finished batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub processed: usize,
    pub total: usize,
    pub files: Vec<FileOutcome>,
    /// Result-store indices of rows that must be completed by hand.
    pub needs_review: Vec<usize>,
    pub log: Vec<LogEntry>,
}

impl BatchReport {
    pub fn appended(&self) -> usize {
        self.files.iter().map(|f| f.rows).sum()
    }

    pub fn failed(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.state == FileState::Failed)
            .count()
    }
}

/// Runs a session's queued files through the pipeline, one at a time.
///
/// Files are processed strictly in queue order with at most one upstream
/// request in flight. A failure on one file is logged and the batch moves on.
pub struct Orchestrator<S> {
    service: S,
    upstage: UpstageConfig,
    pipeline: PipelineConfig,
}

/// What processing one file produced, before it is reported.
struct Processed {
    rows: usize,
    review: Vec<usize>,
}

impl<S: DocumentService> Orchestrator<S> {
    pub fn new(service: S, upstage: UpstageConfig, pipeline: PipelineConfig) -> Self {
        Self {
            service,
            upstage,
            pipeline,
        }
    }

    /// Process every queued file of `session`.
    ///
    /// Previous result rows and raw exchanges are discarded first. `observe`
    /// receives every state change, log line and progress update as it
    /// happens.
    pub async fn run_batch<F>(
        &self,
        session: &mut Session,
        mut observe: F,
    ) -> Result<BatchReport, IngestError>
    where
        F: FnMut(&IngestEvent),
    {
        if session.files().is_empty() {
            return Err(IngestError::NoFiles);
        }
        if !self.service.is_configured() {
            return Err(IngestError::CredentialMissing);
        }

        let session_id = session.id().to_string();
        let (files, results, exchanges) = session.begin_batch();
        let total = files.len();
        let mut report = BatchReport {
            total,
            ..Default::default()
        };

        info!(session = %session_id, total, mode = ?self.pipeline.mode, "batch started");

        let mut emit = |report: &mut BatchReport, event: IngestEvent| {
            if let IngestEvent::Log(entry) = &event {
                report.log.push(entry.clone());
            }
            observe(&event);
        };

        for (index, file) in files.iter().enumerate() {
            emit(&mut report, state_event(index, file, FileState::Queued));
            emit(&mut report, state_event(index, file, FileState::Parsing));
            emit(
                &mut report,
                log(LogLevel::Info, format!("\"{}\" 문서 파싱 중...", file.name)),
            );

            let step = match self.service.parse_document(file, self.pipeline.mode).await {
                Ok(raw) => {
                    let working = match self.pipeline.mode {
                        AnalysisMode::Table => FileState::Extracting,
                        AnalysisMode::Ai => FileState::Analyzing,
                    };
                    emit(&mut report, state_event(index, file, working));
                    if working == FileState::Analyzing {
                        emit(
                            &mut report,
                            log(LogLevel::Info, format!("\"{}\" AI 분석 중...", file.name)),
                        );
                    }
                    self.process_parsed(file, raw, results, exchanges).await
                }
                Err(e) => Err(FileError::from(e)),
            };

            let outcome = match step {
                Ok(processed) => {
                    emit(&mut report, state_event(index, file, FileState::Appended));
                    if processed.review.is_empty() {
                        emit(
                            &mut report,
                            log(LogLevel::Success, format!("\"{}\" 분석 완료", file.name)),
                        );
                    } else {
                        emit(
                            &mut report,
                            log(
                                LogLevel::Info,
                                format!("\"{}\" 자동 추출 실패, 직접 입력이 필요합니다", file.name),
                            ),
                        );
                    }
                    report.needs_review.extend(processed.review);
                    FileOutcome {
                        file: file.name.clone(),
                        state: FileState::Appended,
                        rows: processed.rows,
                        error: None,
                    }
                }
                Err(e) => {
                    warn!(file = %file.name, error = %e, "file failed");
                    emit(&mut report, state_event(index, file, FileState::Failed));
                    emit(&mut report, log(LogLevel::Error, failure_message(&file.name, &e)));
                    FileOutcome {
                        file: file.name.clone(),
                        state: FileState::Failed,
                        rows: 0,
                        error: Some(e.to_string()),
                    }
                }
            };
            report.files.push(outcome);

            report.processed += 1;
            let processed = report.processed;
            emit(&mut report, IngestEvent::Progress { processed, total });
        }

        let appended = report.appended();
        if appended > 0 {
            emit(
                &mut report,
                log(LogLevel::Success, format!("{appended}개 소프트웨어 분석 완료!")),
            );
        }

        info!(
            session = %session_id,
            processed = report.processed,
            appended,
            failed = report.failed(),
            review = report.needs_review.len(),
            "batch finished"
        );
        Ok(report)
    }

    /// Turn a successful parse response into rows. The raw exchange is
    /// recorded whether or not the later steps succeed.
    async fn process_parsed(
        &self,
        file: &UploadedFile,
        raw: serde_json::Value,
        results: &mut ResultStore,
        exchanges: &mut Vec<RawExchange>,
    ) -> Result<Processed, FileError> {
        let mut exchange = RawExchange {
            filename: file.name.clone(),
            parse_response: raw,
            analysis_response: None,
        };
        let outcome = self.extract(file, &mut exchange, results).await;
        exchanges.push(exchange);
        outcome
    }

    async fn extract(
        &self,
        file: &UploadedFile,
        exchange: &mut RawExchange,
        results: &mut ResultStore,
    ) -> Result<Processed, FileError> {
        let parsed: ParseResponse = serde_json::from_value(exchange.parse_response.clone())?;

        match self.pipeline.mode {
            AnalysisMode::Table => {
                let rows = extract_from_response(&parsed);
                if rows.is_empty() {
                    info!(file = %file.name, "no checklist rows found in parsed tables");
                    let index = results.append(ChecklistRecord::placeholder(&file.name));
                    return Ok(Processed {
                        rows: 1,
                        review: vec![index],
                    });
                }
                let count = rows.len();
                for row in rows {
                    results.append(row);
                }
                info!(file = %file.name, rows = count, "extracted checklist rows");
                Ok(Processed {
                    rows: count,
                    review: Vec::new(),
                })
            }
            AnalysisMode::Ai => {
                let text = parsed.plain_text()?;
                let request = build_chat_request(
                    &text,
                    &file.name,
                    &self.upstage,
                    self.pipeline.max_prompt_chars,
                );
                let raw = self.service.chat(&request).await?;
                exchange.analysis_response = Some(raw.clone());

                let completion: ChatCompletion = serde_json::from_value(raw)?;
                match parse_reply(completion.reply_text()) {
                    Ok(record) => {
                        results.append(record);
                        Ok(Processed {
                            rows: 1,
                            review: Vec::new(),
                        })
                    }
                    Err(e) => {
                        warn!(file = %file.name, error = %e, "falling back to placeholder row");
                        let index = results.append(ChecklistRecord::placeholder(&file.name));
                        Ok(Processed {
                            rows: 1,
                            review: vec![index],
                        })
                    }
                }
            }
        }
    }
}

fn state_event(index: usize, file: &UploadedFile, state: FileState) -> IngestEvent {
    IngestEvent::State {
        index,
        file: file.name.clone(),
        state,
    }
}

fn log(level: LogLevel, message: String) -> IngestEvent {
    match level {
        LogLevel::Error => warn!(target: "eduzip::batch", "{message}"),
        _ => info!(target: "eduzip::batch", "{message}"),
    }
    IngestEvent::Log(LogEntry::new(level, message))
}

/// Credential and billing failures get a fixed message; anything else names the file.
fn failure_message(file: &str, error: &FileError) -> String {
    if error.is_credential_failure() {
        "API 키 오류: 크레딧 부족 또는 유효하지 않은 API 키".to_string()
    } else {
        format!("\"{file}\" 분석 실패: {error}")
    }
}
