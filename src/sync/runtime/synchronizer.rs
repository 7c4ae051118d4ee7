use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use serde_json::Value;

use crate::error::{Result, SyncError, ValidationError};
use crate::sync::chain::{IndexGateway, Wallet, WalletGuard};
use crate::sync::domain::{fields, DATA_INDEX_LABEL, FIELDS, ROOT};
use crate::sync::engine::{self, FieldPlan, RootDecision};
use crate::sync::notify::{self, Notification, Notifier};
use crate::sync::storage::UploaderConfig;
use crate::sync::types::{
    notifications_uri, Contents, DataIndex, DeleteOptions, Record, UpdateOptions, UpdateOutcome,
};

/// **Synchronizer**
///
/// The imperative shell around the decision [`engine`]. For every call it:
/// 1. **Validates** the record against the field registry and stamps timestamps.
/// 2. **Fans out** the field uploads to their backends and joins them.
/// 3. **Executes** what the engine decides: root document upload, on-chain write.
/// 4. **Notifies** subscribers, best-effort.
///
/// It holds no per-request state; concurrent calls only share the gateway, the
/// backends and the wallet, which is unlocked for the on-chain write alone.
pub struct Synchronizer<G, N> {
    uploaders: UploaderConfig,
    gateway: G,
    notifier: N,
    wallet: Arc<dyn Wallet>,
    wallet_password: String,
}

impl<G, N> Synchronizer<G, N>
where
    G: IndexGateway,
    N: Notifier,
{
    pub fn new(
        uploaders: UploaderConfig,
        gateway: G,
        notifier: N,
        wallet: Arc<dyn Wallet>,
        wallet_password: impl Into<String>,
    ) -> Self {
        Self {
            uploaders,
            gateway,
            notifier,
            wallet,
            wallet_password: wallet_password.into(),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Publish a new hotel and return its on-chain address.
    pub async fn create_hotel(&self, mut record: Record) -> Result<String> {
        fields::validate(&record, true)?;
        fields::stamp_timestamps(&mut record);

        let plan = engine::plan_fields(&record, None);
        log::info!("[SYNC] create: publishing {:?}", plan.subjects);
        let contents = self.upload_fields(&plan).await?;

        let root_uri = self.upload_root(&contents, None).await?;
        let address = {
            let wallet = self.unlock()?;
            self.gateway.create_hotel(&wallet, &root_uri).await?
        };
        log::info!("[SYNC] create: hotel {address} -> {root_uri}");

        if let Some(uri) = notifications_uri(&contents) {
            let event = Notification::hotel_created(self.gateway.index_address(), &address);
            notify::dispatch(&self.notifier, uri, &event).await;
        }
        Ok(address)
    }

    /// Publish the fields present in `record` and reconcile the root index.
    ///
    /// The on-chain pointer is only rewritten when the merged index differs from the
    /// published one and its new document landed at a different URI.
    pub async fn update_hotel(
        &self,
        address: &str,
        mut record: Record,
        options: UpdateOptions,
    ) -> Result<UpdateOutcome> {
        self.check_address(address)?;
        fields::validate(&record, false)?;
        if fields::present_fields(&record).next().is_none() {
            return Err(SyncError::BadRequest("No data provided".to_string()));
        }
        fields::stamp_timestamps(&mut record);

        let baseline = self.gateway.get_data_index(address).await?;
        log::debug!("[SYNC] update {address}: baseline {}", baseline.reference);

        let plan = engine::plan_fields(&record, Some(&baseline.contents));
        let uploaded = self.upload_fields(&plan).await?;
        let merged = engine::merge(&baseline.contents, &uploaded);

        let mut outcome = UpdateOutcome {
            subjects: plan.subjects.clone(),
            data_index_uri: baseline.reference.clone(),
        };

        match engine::decide_root(&baseline, merged.clone(), options.force_sync) {
            RootDecision::Unchanged => {
                log::info!("[SYNC] update {address}: data index unchanged");
            }
            RootDecision::Rewrite {
                contents,
                preferred_url,
            } => {
                let root_uri = self.upload_root(&contents, Some(&preferred_url)).await?;
                outcome.subjects.push("dataIndex".to_string());
                if engine::needs_pointer_update(&baseline.reference, &root_uri) {
                    let wallet = self.unlock()?;
                    self.gateway.update_hotel(&wallet, address, &root_uri).await?;
                    outcome.subjects.push("onChain".to_string());
                }
                log::info!("[SYNC] update {address}: data index -> {root_uri}");
                outcome.data_index_uri = root_uri;
            }
            RootDecision::Repair {
                contents,
                preferred_url,
            } => {
                let root_uri = self.upload_root(&contents, Some(&preferred_url)).await?;
                if root_uri != baseline.reference {
                    log::warn!(
                        "[SYNC] update {address}: forced re-upload landed at {root_uri}, on-chain pointer kept at {}",
                        baseline.reference
                    );
                }
            }
        }

        let event = Notification::hotel_updated(
            self.gateway.index_address(),
            address,
            outcome.subjects.clone(),
        );
        for target in engine::notification_targets(&baseline.contents, &merged) {
            notify::dispatch(&self.notifier, &target, &event).await;
        }
        Ok(outcome)
    }

    /// Remove the hotel from the index, and optionally its off-chain documents.
    pub async fn delete_hotel(&self, address: &str, options: DeleteOptions) -> Result<()> {
        self.check_address(address)?;

        let index = match self.gateway.get_data_index(address).await {
            Ok(index) => Some(index),
            Err(e) => {
                log::warn!("[SYNC] delete {address}: data index not resolvable, continuing: {e}");
                None
            }
        };

        {
            let wallet = self.unlock()?;
            self.gateway.remove_hotel(&wallet, address).await?;
        }
        log::info!("[SYNC] delete: hotel {address} removed from index");

        if options.purge_off_chain {
            match &index {
                Some(index) => self.purge(index).await,
                None => log::warn!("[SYNC] delete {address}: nothing known to purge"),
            }
        }

        if let Some(uri) = index.as_ref().and_then(DataIndex::notifications_uri) {
            let event = Notification::hotel_deleted(self.gateway.index_address(), address);
            notify::dispatch(&self.notifier, uri, &event).await;
        }
        Ok(())
    }

    /// Resolved documents of a hotel.
    ///
    /// Without a filter every field is returned and required fields must be there; with a
    /// filter only the named fields are returned and nothing is required.
    pub async fn get_hotel(&self, address: &str, filter: &[String]) -> Result<Record> {
        self.check_address(address)?;
        for name in filter {
            if fields::field(name).is_none() {
                return Err(ValidationError::UnknownField(name.clone()).into());
            }
        }
        let names: Vec<&str> = FIELDS
            .iter()
            .map(|f| f.name)
            .filter(|name| filter.is_empty() || filter.iter().any(|f| f == name))
            .collect();

        let data = self.gateway.get_documents(address, &names).await?;
        fields::validate(&data, filter.is_empty()).map_err(|e| {
            log::warn!("[SYNC] get {address}: upstream data invalid: {e}");
            SyncError::UpstreamBadGateway(
                "Invalid upstream response - hotel data is not valid.".to_string(),
            )
        })?;
        Ok(data)
    }

    /// Hand the hotel over to another manager.
    pub async fn transfer_hotel(&self, address: &str, manager: &str) -> Result<()> {
        self.check_address(address)?;
        if !self.gateway.is_valid_address(manager) {
            return Err(ValidationError::invalid("/manager", "Not a valid address").into());
        }
        let wallet = self.unlock()?;
        self.gateway.transfer_hotel(&wallet, address, manager).await?;
        log::info!("[SYNC] transfer: hotel {address} -> manager {manager}");
        Ok(())
    }

    // ================================
    // Side effects
    // ================================

    /// Upload every pointer document concurrently; the first failure aborts the rest.
    async fn upload_fields(&self, plan: &FieldPlan) -> Result<Contents> {
        let uploads = plan.uploads.iter().map(|upload| async move {
            let uploader = self.uploaders.get_uploader(upload.field.name);
            let uri = uploader
                .upload(&upload.data, upload.field.name, upload.preferred_url.as_deref())
                .await?;
            log::debug!("[SYNC] uploaded {} -> {uri}", upload.field.name);
            Ok::<_, SyncError>((upload.field.key, uri))
        });
        let uploaded = try_join_all(uploads).await?;

        let mut contents = plan.inline.clone();
        for (key, uri) in uploaded {
            contents.insert(key.to_string(), Value::String(uri));
        }
        Ok(contents)
    }

    async fn upload_root(&self, contents: &Contents, preferred_url: Option<&str>) -> Result<String> {
        let document = Value::Object(contents.clone());
        log::trace!("[SYNC] root document {document}");
        self.uploaders
            .get_uploader(ROOT)
            .upload(&document, DATA_INDEX_LABEL, preferred_url)
            .await
    }

    /// Remove the hotel's documents. Every removal is attempted; none is fatal.
    async fn purge(&self, index: &DataIndex) {
        let removals = engine::purge_targets(index).into_iter().map(|target| async move {
            let uploader = self.uploaders.get_uploader(target.uploader);
            match uploader.remove(&target.url).await {
                Ok(true) => log::debug!("[SYNC] purged {}", target.url),
                Ok(false) => log::info!(
                    "[SYNC] {} is outside the configured storage, not purged",
                    target.url
                ),
                Err(e) => log::warn!("[SYNC] could not purge {}: {e}", target.url),
            }
        });
        join_all(removals).await;
    }

    fn unlock(&self) -> Result<WalletGuard<'_>> {
        WalletGuard::acquire(self.wallet.as_ref(), &self.wallet_password)
    }

    fn check_address(&self, address: &str) -> Result<()> {
        if !self.gateway.is_valid_address(address) {
            return Err(SyncError::NotFound(format!("no hotel at {address}")));
        }
        Ok(())
    }
}
