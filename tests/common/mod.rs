//! Scripted in-memory backend shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

use vibration_diag::backend::{
    AnalysisBackend, Analyzed, BackendError, MachineDirectory, StorageBackend,
};
use vibration_diag::types::{
    DetectedFault, Diagnosis, FaultDetection, FileBlob, FileInfo, FrequencyFeatures, Machine,
    NewRecord, RecordId, SignalAnalysis, StoredFile, TimeFeatures, UploadRequest,
};

/// Records ids `r1`, `r2`, ... in creation order. Failures are scripted per
/// file name (storage, record creation) or per record id (analysis, consumed
/// one outcome per call; unscripted calls succeed).
#[derive(Default)]
pub struct ScriptedBackend {
    pub failing_store: HashSet<String>,
    pub failing_record: HashSet<String>,
    pub machines: Vec<Machine>,
    analysis_script: Mutex<HashMap<String, VecDeque<BackendError>>>,
    analysis_delay: Mutex<HashMap<String, Duration>>,
    record_gate: Option<Arc<Semaphore>>,
    next_record: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_store(mut self, file_name: &str) -> Self {
        self.failing_store.insert(file_name.to_string());
        self
    }

    pub fn fail_record(mut self, file_name: &str) -> Self {
        self.failing_record.insert(file_name.to_string());
        self
    }

    pub fn with_machines(mut self, ids: &[&str]) -> Self {
        self.machines = ids
            .iter()
            .map(|id| Machine {
                id: (*id).to_string(),
                name: format!("Machine {id}"),
                machine_type: "pump".to_string(),
                status: "active".to_string(),
                health_score: None,
            })
            .collect();
        self
    }

    /// Each `create_record` call waits for one permit from `gate`.
    pub fn with_record_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.record_gate = Some(gate);
        self
    }

    /// Hold every analysis of `record_id` for `ms` milliseconds.
    pub fn delay_analysis(&self, record_id: &str, ms: u64) {
        self.analysis_delay
            .lock()
            .unwrap()
            .insert(record_id.to_string(), Duration::from_millis(ms));
    }

    /// Queue a failure for the next analysis of `record_id`.
    pub fn fail_analysis(&self, record_id: &str, error: BackendError) {
        self.analysis_script
            .lock()
            .unwrap()
            .entry(record_id.to_string())
            .or_default()
            .push_back(error);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_starting(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl StorageBackend for ScriptedBackend {
    async fn store_file(
        &self,
        file: &FileBlob,
        _request: &UploadRequest,
    ) -> Result<StoredFile, BackendError> {
        self.log(format!("store:{}", file.name()));
        tokio::task::yield_now().await;
        if self.failing_store.contains(file.name()) {
            return Err(BackendError::Rejected(format!(
                "storage quota exceeded for {}",
                file.name()
            )));
        }
        Ok(StoredFile {
            storage_path: format!("uploads/{}", file.name()),
            public_url: format!("http://files.local/uploads/{}", file.name()),
            file_name: file.name().to_string(),
        })
    }

    async fn create_record(&self, record: &NewRecord) -> Result<RecordId, BackendError> {
        self.log(format!("record:{}", record.file_name));
        if let Some(gate) = &self.record_gate {
            gate.acquire().await.unwrap().forget();
        }
        tokio::task::yield_now().await;
        if self.failing_record.contains(&record.file_name) {
            return Err(BackendError::Status {
                status: 422,
                detail: "machine not found".to_string(),
            });
        }
        let n = self.next_record.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(RecordId::new(format!("r{n}")))
    }
}

#[async_trait]
impl AnalysisBackend for ScriptedBackend {
    async fn analyze_record(&self, record_id: &RecordId) -> Result<Analyzed, BackendError> {
        self.log(format!("analyze:{record_id}"));
        let delay = self
            .analysis_delay
            .lock()
            .unwrap()
            .get(record_id.as_str())
            .copied();
        match delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }
        let scripted = self
            .analysis_script
            .lock()
            .unwrap()
            .get_mut(record_id.as_str())
            .and_then(VecDeque::pop_front);
        match scripted {
            Some(error) => Err(error),
            None => Ok(Analyzed {
                analyzed_at: None,
                diagnosis: healthy_diagnosis(record_id.as_str()),
            }),
        }
    }
}

#[async_trait]
impl MachineDirectory for ScriptedBackend {
    async fn list_machines(&self) -> Result<Vec<Machine>, BackendError> {
        self.log("machines".to_string());
        Ok(self.machines.clone())
    }
}

pub fn healthy_diagnosis(file_name: &str) -> Diagnosis {
    Diagnosis {
        file_info: Some(FileInfo {
            filename: file_name.to_string(),
            file_path: None,
        }),
        signal_analysis: Some(SignalAnalysis {
            signal_length: Some(12_000),
            sampling_rate: Some(12_000.0),
            duration_seconds: Some(1.0),
            time_features: Some(TimeFeatures {
                rms: Some(0.42),
                peak: Some(1.3),
                crest_factor: Some(3.1),
                ..TimeFeatures::default()
            }),
            frequency_features: Some(FrequencyFeatures {
                dominant_frequency: Some(29.8),
                dominant_magnitude: Some(0.9),
                ..FrequencyFeatures::default()
            }),
            plots: None,
        }),
        fault_detection: Some(FaultDetection {
            detected_faults: vec![DetectedFault {
                fault_type: "Imbalance".to_string(),
                severity: 35.0,
                confidence: 0.8,
                description: "1x running speed dominant".to_string(),
            }],
            fault_count: Some(1),
            analysis_method: Some("rule_based".to_string()),
        }),
        health_score: Some(82.0),
        recommendations: Vec::new(),
    }
}

pub fn blobs(names: &[&str]) -> Vec<FileBlob> {
    names
        .iter()
        .map(|name| FileBlob::new(*name, b"time,amplitude\n0,0.1\n".to_vec()))
        .collect()
}

pub fn request(machine_id: &str) -> UploadRequest {
    UploadRequest {
        machine_id: machine_id.to_string(),
        sensor_position: "Drive End".to_string(),
        axis: "Horizontal".to_string(),
        sampling_rate_hz: 12_000,
    }
}
