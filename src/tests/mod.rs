//! Test modules and shared helpers


#[cfg(test)]
pub mod helpers {
    use std::collections::{BTreeMap, BTreeSet};
    use std::path::Path;
    use std::sync::Mutex;

    use crate::config::Settings;
    use crate::constants::{KVSTORE_STANZA, LIMITS_CONF};
    use crate::error::{AppError, AppResult};
    use crate::models::row::Row;
    use crate::services::kvstore::KvService;
    use crate::services::script_log::ScriptLog;

    /// One call made against [`RecordingStore`].
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum Call {
        ListCollections,
        CreateCollection(String),
        DeleteCollection(String),
        BatchSave(String, Vec<Row>),
        ListStanzas(String),
        CreateStanza(String, String),
        StanzaContent(String, String),
        SubmitStanza(String, String),
        Reload,
    }

    /// In-memory `KvService` that records every call in order.
    #[derive(Default)]
    pub struct RecordingStore {
        pub calls: Mutex<Vec<Call>>,
        pub collections: Mutex<BTreeSet<String>>,
        pub stanzas: Mutex<BTreeMap<String, BTreeMap<String, String>>>,
        /// 1-based index of the `batch_save` call that fails
        pub fail_batch: Option<usize>,
        /// Status returned by the reload endpoint instead of success
        pub reload_status: Option<u16>,
        /// Make stanza listing fail
        pub fail_list_stanzas: bool,
        /// Make collection creation fail
        pub fail_create_collection: bool,
    }

    impl RecordingStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_collection(self, name: &str) -> Self {
            self.collections.lock().unwrap().insert(name.to_owned());
            self
        }

        /// Adds the `limits.conf [kvstore]` stanza with the given content.
        pub fn with_kvstore_stanza(self, content: &[(&str, &str)]) -> Self {
            let content = content
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect();
            self.stanzas
                .lock()
                .unwrap()
                .insert(KVSTORE_STANZA.to_owned(), content);
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub fn collections(&self) -> BTreeSet<String> {
            self.collections.lock().unwrap().clone()
        }

        pub fn stanza_value(&self, key: &str) -> Option<String> {
            self.stanzas
                .lock()
                .unwrap()
                .get(KVSTORE_STANZA)
                .and_then(|s| s.get(key).cloned())
        }

        /// Row counts of every `batch_save`, in call order.
        pub fn batch_sizes(&self) -> Vec<usize> {
            self.saved_batches().iter().map(Vec::len).collect()
        }

        pub fn saved_batches(&self) -> Vec<Vec<Row>> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::BatchSave(_, rows) => Some(rows),
                    _ => None,
                })
                .collect()
        }

        pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
            self.calls().iter().filter(|c| matches(c)).count()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    fn api_error(status: u16, endpoint: &str) -> AppError {
        AppError::Api {
            status,
            endpoint: endpoint.to_owned(),
            message: "rejected by test store".to_owned(),
        }
    }

    impl KvService for RecordingStore {
        async fn list_collections(&self) -> AppResult<BTreeSet<String>> {
            self.record(Call::ListCollections);
            Ok(self.collections())
        }

        async fn create_collection(&self, name: &str) -> AppResult<()> {
            self.record(Call::CreateCollection(name.to_owned()));
            if self.fail_create_collection {
                return Err(api_error(409, "storage/collections/config"));
            }
            self.collections.lock().unwrap().insert(name.to_owned());
            Ok(())
        }

        async fn delete_collection(&self, name: &str) -> AppResult<()> {
            self.record(Call::DeleteCollection(name.to_owned()));
            self.collections.lock().unwrap().remove(name);
            Ok(())
        }

        async fn batch_save(&self, collection: &str, rows: &[Row]) -> AppResult<()> {
            let index = self.count(|c| matches!(c, Call::BatchSave(..))) + 1;
            self.record(Call::BatchSave(collection.to_owned(), rows.to_vec()));
            if self.fail_batch == Some(index) {
                return Err(api_error(400, "batch_save"));
            }
            Ok(())
        }

        async fn list_stanzas(&self, conf: &str) -> AppResult<BTreeSet<String>> {
            self.record(Call::ListStanzas(conf.to_owned()));
            if self.fail_list_stanzas {
                return Err(api_error(503, "configs/conf-limits"));
            }
            assert_eq!(conf, LIMITS_CONF);
            Ok(self.stanzas.lock().unwrap().keys().cloned().collect())
        }

        async fn create_stanza(&self, conf: &str, stanza: &str) -> AppResult<()> {
            self.record(Call::CreateStanza(conf.to_owned(), stanza.to_owned()));
            self.stanzas
                .lock()
                .unwrap()
                .insert(stanza.to_owned(), BTreeMap::new());
            Ok(())
        }

        async fn stanza_content(
            &self,
            conf: &str,
            stanza: &str,
        ) -> AppResult<BTreeMap<String, String>> {
            self.record(Call::StanzaContent(conf.to_owned(), stanza.to_owned()));
            self.stanzas
                .lock()
                .unwrap()
                .get(stanza)
                .cloned()
                .ok_or_else(|| api_error(404, stanza))
        }

        async fn submit_stanza(
            &self,
            _conf: &str,
            stanza: &str,
            key: &str,
            value: &str,
        ) -> AppResult<()> {
            self.record(Call::SubmitStanza(key.to_owned(), value.to_owned()));
            self.stanzas
                .lock()
                .unwrap()
                .entry(stanza.to_owned())
                .or_default()
                .insert(key.to_owned(), value.to_owned());
            Ok(())
        }

        async fn reload_app(&self) -> AppResult<()> {
            self.record(Call::Reload);
            match self.reload_status {
                Some(status) => Err(api_error(status, "debug/refresh")),
                None => Ok(()),
            }
        }
    }

    /// CSV text with header `id,name` and `rows` data rows.
    pub fn csv_with_rows(rows: usize) -> String {
        let mut text = String::from("id,name\n");
        for i in 1..=rows {
            text.push_str(&format!("{i},row-{i}\n"));
        }
        text
    }

    /// Settings pointing at files inside `dir`.
    pub fn test_settings(dir: &Path, rebuild: bool) -> Settings {
        Settings::from_ini_str(&format!(
            "[SPLUNK]
DEBUG_MODE = false
LOG_FILE = {log}
INPUT_CSV = {csv}
SPLUNK_SERVER = 127.0.0.1
SPLUNK_SERVER_PORT = 8089
SPLUNK_APP = search
COLLECTION_OWNER = nobody
COLLECTION_NAME = assets
SPLUNK_USER = admin
DELETE_AND_REBUILD = {rebuild}
",
            log = dir.join("csv2kvstore.log").display(),
            csv = dir.join("input.csv").display(),
        ))
        .unwrap()
    }

    pub fn test_log(dir: &Path) -> ScriptLog {
        ScriptLog::new(dir.join("csv2kvstore.log"))
    }

    pub fn read_log(dir: &Path) -> Vec<String> {
        std::fs::read_to_string(dir.join("csv2kvstore.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    /// Log lines carrying `script_action=<action>`.
    pub fn log_entries(dir: &Path, action: &str) -> Vec<String> {
        let marker = format!(",script_action={action},msg=");
        read_log(dir)
            .into_iter()
            .filter(|l| l.contains(&marker))
            .collect()
    }
}
