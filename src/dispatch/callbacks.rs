//! Engine events for pending requests.

use tracing::{debug, info, trace, warn};

use crate::api::error::{ApiError, ErrorCode};
use crate::dispatch::core::Core;
use crate::dispatch::requests::decode_pw_key;
use crate::engine::{EngineEvent, ExportedLink, NodeTree, OpenedLink, PwKey, SignupLink, Tag};
use crate::fs::{AccountDetails, Handle, NodeType};
use crate::listener::Notification;
use crate::public::{LinkKind, PublicNode, build_link};
use crate::request::RequestType;

impl Core {
    /// Apply one engine event to the pending records.
    pub(crate) fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::LoginResult { tag, error }
            | EngineEvent::FetchNodesResult { tag, error }
            | EngineEvent::FileAttributeStored { tag, error }
            | EngineEvent::AccountDetailsFailed { tag, error }
            | EngineEvent::ChangePasswordResult { tag, error }
            | EngineEvent::InviteResult { tag, error }
            | EngineEvent::SignupLinkSent { tag, error }
            | EngineEvent::SignupConfirmed { tag, error }
            | EngineEvent::RequestError { tag, error } => self.finish_tag(tag, error),

            EngineEvent::NodeAttrUpdated { tag, node, error } => {
                self.node_result(tag, RequestType::Rename, node, error)
            }
            EngineEvent::NodeMoved { tag, node, error } => {
                self.node_result(tag, RequestType::Move, node, error)
            }
            EngineEvent::NodeUnlinked { tag, node, error } => {
                self.node_result(tag, RequestType::Remove, node, error)
            }
            EngineEvent::PutNodesResult { tag, error, node } => {
                self.put_nodes_result(tag, error, node)
            }
            EngineEvent::ShareResult { tag, error } => self.share_result(tag, error),
            EngineEvent::ExportResult { tag, result } => self.export_result(tag, result),
            EngineEvent::OpenFileLinkResult { tag, result } => {
                self.open_file_link_result(tag, result)
            }
            EngineEvent::FileAttributeFetched { tag, node, data } => {
                self.file_attribute_fetched(tag, node, data)
            }
            EngineEvent::FileAttributeFailed { tag, node, retries } => {
                self.file_attribute_failed(tag, node, retries)
            }
            EngineEvent::AccountDetails { tag, details } => self.account_details(tag, details),
            EngineEvent::EphemeralResult { tag, error } => self.ephemeral_result(tag, error),
            EngineEvent::SignupLinkQueried { tag, result } => {
                self.signup_link_queried(tag, result)
            }
            EngineEvent::NotifyRetry { delay } => {
                debug!("Engine retrying pending connections in {} ds", delay)
            }

            EngineEvent::TransferAdded {
                id,
                tag,
                direction,
                size,
            } => self.transfer_added(id, tag, direction, size),
            EngineEvent::TransferPrepare {
                id,
                local_path,
                size,
                node,
            } => self.transfer_prepare(id, &local_path, size, node),
            EngineEvent::TransferUpdate {
                id,
                progress,
                last_data,
            } => self.transfer_update(id, progress, last_data),
            EngineEvent::TransferFailed {
                id,
                error,
                next_attempt,
            } => self.transfer_failed(id, error, next_attempt),
            EngineEvent::TransferLimit { id } => self.transfer_limit(id),
            EngineEvent::TransferRemoved { id, direction } => self.transfer_removed(id, direction),
            EngineEvent::TransferComplete {
                id,
                direction,
                size,
                node,
                upload_token,
            } => self.transfer_complete(id, direction, size, node, upload_token),

            EngineEvent::UsersUpdated(users) => self.notify(Notification::UsersUpdated(users)),
            EngineEvent::NodesUpdated(nodes) => self.notify(Notification::NodesUpdated(nodes)),
            EngineEvent::ReloadNeeded { reason } => {
                info!("Engine requests a reload: {}", reason);
                self.notify(Notification::ReloadNeeded);
            }
            EngineEvent::SyncStateChanged => self.notify(Notification::SyncStateChanged),
            EngineEvent::SyncScanning(scanning) => {
                self.sync_scanning = scanning;
                self.notify(Notification::SyncStateChanged);
            }
        }
    }

    /// Result of an operation on one existing node.
    fn node_result(&mut self, tag: Tag, expected: RequestType, node: Handle, error: ErrorCode) {
        match self.requests.get_mut(&tag) {
            Some(request) if request.request_type == expected => {
                request.node_handle = Some(node);
            }
            Some(request) => {
                trace!("Ignoring node result for {} request", request.request_type);
                return;
            }
            None => return,
        }
        self.finish_tag(tag, error);
    }

    fn put_nodes_result(&mut self, tag: Tag, error: ErrorCode, node: Option<Handle>) {
        let Some(mut request) = self.requests.remove(&tag) else {
            return;
        };

        if request.request_type == RequestType::Upload {
            // The upload's own finish stands in for the request's
            if let Some(mut transfer) = request.transfer.take() {
                transfer.node_handle = node;
                self.finish_transfer(*transfer, error.into());
            }
            return;
        }

        if node.is_some() {
            request.node_handle = node;
        }
        self.finish_request(request, error.into());
    }

    fn share_result(&mut self, tag: Tag, error: ErrorCode) {
        match self.requests.get(&tag) {
            Some(request) if request.request_type == RequestType::Export => {}
            Some(_) => self.finish_tag(tag, error),
            None => {}
        }
    }

    fn export_result(&mut self, tag: Tag, result: Result<ExportedLink, ErrorCode>) {
        let exported = match result {
            Ok(exported) => exported,
            Err(error) => return self.finish_tag(tag, error),
        };
        let Some(request) = self.requests.get_mut(&tag) else {
            return;
        };

        if self.engine.node(exported.node).is_none() {
            request.node_handle = None;
            return self.finish_tag(tag, ErrorCode::NoEnt);
        }
        let Some(key) = &exported.key else {
            return self.finish_tag(tag, ErrorCode::Key);
        };

        let kind = match exported.node_type {
            NodeType::File => LinkKind::File,
            _ => LinkKind::Folder,
        };
        request.link = Some(build_link(kind, exported.public_handle, key));
        self.finish_tag(tag, ErrorCode::Ok);
    }

    fn open_file_link_result(&mut self, tag: Tag, result: Result<OpenedLink, ErrorCode>) {
        let opened = match result {
            Ok(opened) => opened,
            Err(error) => return self.finish_tag(tag, error),
        };
        let Some(request) = self.requests.get_mut(&tag) else {
            return;
        };
        if !self.engine.logged_in() {
            return self.finish_tag(tag, ErrorCode::Access);
        }

        let public = PublicNode::new_file(
            opened.public_handle,
            opened.key,
            opened.name,
            opened.size,
            opened.attr_string,
        )
        .with_times(opened.ctime, opened.mtime);

        match request.request_type {
            RequestType::ImportLink => {
                let parent = request.parent_handle;
                let Some(next) = self.rearm(tag) else { return };
                self.engine.put_public_node(next, parent, &public);
            }
            RequestType::GetPublicNode => {
                request.set_public_node(Some(&public));
                self.finish_tag(tag, ErrorCode::Ok);
            }
            other => trace!("Ignoring opened link for {} request", other),
        }
    }

    fn file_attribute_fetched(&mut self, tag: Tag, node: Handle, data: Vec<u8>) {
        let Some(request) = self.requests.get(&tag) else {
            return;
        };
        let Some(path) = request.file.clone() else {
            return self.finish_tag(tag, ErrorCode::Args);
        };

        match std::fs::write(&path, &data) {
            Ok(()) => {
                debug!("Attribute of node {} written to {}", node, path);
                self.finish_tag(tag, ErrorCode::Ok);
            }
            Err(e) => {
                warn!("Cannot write attribute to {}: {}", path, e);
                self.finish_tag(tag, ErrorCode::Write);
            }
        }
    }

    fn file_attribute_failed(&mut self, tag: Tag, node: Handle, retries: u32) {
        let Some(request) = self.requests.get_mut(&tag) else {
            return;
        };

        if retries > self.config.file_attribute_retries {
            debug!("Giving up on attribute of node {} after {} tries", node, retries);
            self.engine.abandon_file_attribute(tag);
            return self.finish_tag(tag, ErrorCode::Internal);
        }

        request.num_retry = retries;
        self.request_temporary_error(tag, ApiError::new(ErrorCode::Again));
    }

    fn account_details(&mut self, tag: Tag, details: AccountDetails) {
        let Some(request) = self.requests.get_mut(&tag) else {
            return;
        };
        let merged = request.account_details.get_or_insert_with(AccountDetails::default);
        merge_details(merged, details);

        request.num_details = request.num_details.saturating_sub(1);
        if request.num_details == 0 {
            self.finish_tag(tag, ErrorCode::Ok);
        }
    }

    fn ephemeral_result(&mut self, tag: Tag, error: ErrorCode) {
        if !error.is_ok() {
            return self.finish_tag(tag, error);
        }
        let Some(request) = self.requests.get(&tag) else {
            return;
        };
        let kind = request.request_type;
        let (email, name) = (
            request.email.clone().unwrap_or_default(),
            request.name.clone().unwrap_or_default(),
        );

        let key = match self.account_pw_key(kind, tag) {
            Ok(key) => key,
            Err(code) => return self.finish_tag(tag, code),
        };

        let Some(next) = self.rearm(tag) else { return };
        self.engine.send_signup_link(next, &email, &name, &key);
    }

    fn signup_link_queried(&mut self, tag: Tag, result: Result<SignupLink, ErrorCode>) {
        let link = match result {
            Ok(link) => link,
            Err(error) => return self.finish_tag(tag, error),
        };
        let Some(request) = self.requests.get_mut(&tag) else {
            return;
        };
        request.email = Some(link.email.clone());
        request.name = Some(link.name.clone());
        let kind = request.request_type;

        if kind == RequestType::QuerySignupLink {
            return self.finish_tag(tag, ErrorCode::Ok);
        }

        let key = match self.account_pw_key(kind, tag) {
            Ok(key) => key,
            Err(code) => return self.finish_tag(tag, code),
        };

        let Some(next) = self.rearm(tag) else { return };
        if let Err(code) = self.engine.confirm_signup_link(next, &link, &key) {
            self.finish_tag(next, code);
        }
    }

    /// Password key of an account request: derived from the password for
    /// the plain variants, decoded from the private key for fast ones.
    fn account_pw_key(&self, request_type: RequestType, tag: Tag) -> Result<PwKey, ErrorCode> {
        let request = self.requests.get(&tag).ok_or(ErrorCode::Internal)?;
        match request_type {
            RequestType::FastCreateAccount | RequestType::FastConfirmAccount => {
                decode_pw_key(request.private_key.as_deref().unwrap_or_default())
            }
            _ => self
                .engine
                .pw_key(request.password.as_deref().unwrap_or_default())
                .map_err(|_| ErrorCode::Args),
        }
    }
}

/// Fold one account details reply into the accumulated snapshot.
fn merge_details(into: &mut AccountDetails, part: AccountDetails) {
    if part.storage_max > 0 || part.storage_used > 0 {
        into.storage_used = part.storage_used;
        into.storage_max = part.storage_max;
    }
    if part.transfer_max > 0 || part.transfer_used > 0 {
        into.transfer_used = part.transfer_used;
        into.transfer_max = part.transfer_max;
    }
    if part.pro_level != 0 {
        into.pro_level = part.pro_level;
    }
    into.storage.extend(part.storage);
    into.num_sessions = into.num_sessions.max(part.num_sessions);
    into.num_transactions = into.num_transactions.max(part.num_transactions);
    into.num_purchases = into.num_purchases.max(part.num_purchases);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::StorageUsage;

    #[test]
    fn test_merge_details_keeps_earlier_parts() {
        let mut acc = AccountDetails::default();
        let mut quota = AccountDetails {
            storage_used: 10,
            storage_max: 100,
            pro_level: 2,
            ..Default::default()
        };
        quota.storage.insert(1, StorageUsage { bytes: 10, files: 1, folders: 0 });
        merge_details(&mut acc, quota);
        merge_details(
            &mut acc,
            AccountDetails {
                num_sessions: 3,
                ..Default::default()
            },
        );

        assert_eq!(acc.storage_max, 100);
        assert_eq!(acc.pro_level, 2);
        assert_eq!(acc.num_sessions, 3);
        assert_eq!(acc.storage_of(1).files, 1);
    }
}
