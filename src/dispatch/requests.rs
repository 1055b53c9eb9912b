//! Request validation and submission.

use tracing::debug;

use crate::api::error::{ApiError, ErrorCode};
use crate::base64::base64url_decode;
use crate::dispatch::core::Core;
use crate::engine::{NodeTree, PwKey, Tag};
use crate::fs::{AccessLevel, AccountDetails, DetailParts, Handle, Node};
use crate::listener::Notification;
use crate::public::{parse_file_link, parse_folder_link};
use crate::request::{Request, RequestType};

/// What happened to a request handed to the engine.
enum Submitted {
    /// The outcome will arrive as an engine event.
    Pending,
    /// Nothing left to wait for; finish with success.
    Done,
}

/// A string field that must be present and non-empty.
fn required(value: &Option<String>) -> Result<&str, ErrorCode> {
    value
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(ErrorCode::Args)
}

/// Decode a base64 password key.
pub(crate) fn decode_pw_key(encoded: &str) -> Result<PwKey, ErrorCode> {
    let bytes = base64url_decode(encoded).map_err(|_| ErrorCode::Args)?;
    PwKey::try_from(bytes.as_slice()).map_err(|_| ErrorCode::Args)
}

/// Confirmation payload of a signup link (`...#confirmCODE` or bare code).
fn signup_code(link: &str) -> Result<Vec<u8>, ErrorCode> {
    let encoded = match link.find("#confirm") {
        Some(pos) => &link[pos + "#confirm".len()..],
        None => link,
    };
    match base64url_decode(encoded) {
        Ok(code) if !code.is_empty() => Ok(code),
        _ => Err(ErrorCode::Args),
    }
}

impl Core {
    /// File a dequeued request under a new tag and hand it to the engine.
    pub(crate) fn send_request(&mut self, mut request: Request) {
        let tag = self.engine.next_tag();
        request.tag = Some(tag);
        debug!("Dispatching {} request as tag {}", request.request_type(), tag);
        self.notify(Notification::RequestStart(request.clone()));

        match self.submit_request(&mut request, tag) {
            Ok(Submitted::Pending) => {
                self.requests.insert(tag, request);
            }
            Ok(Submitted::Done) => self.finish_request(request, ApiError::ok()),
            Err(code) => {
                debug!("{} request rejected: {}", request.request_type(), code.description());
                self.finish_request(request, code.into());
            }
        }
    }

    fn existing(&self, handle: Option<Handle>) -> Result<Node, ErrorCode> {
        handle
            .and_then(|h| self.engine.node(h))
            .ok_or(ErrorCode::Args)
    }

    fn submit_request(&mut self, request: &mut Request, tag: Tag) -> Result<Submitted, ErrorCode> {
        match request.request_type {
            RequestType::Login => {
                let email = required(&request.email)?;
                let key = self.engine.pw_key(required(&request.password)?)?;
                self.engine.login(tag, email, &key);
            }
            RequestType::FastLogin => {
                let email = required(&request.email)?;
                required(&request.password)?;
                let key = decode_pw_key(required(&request.private_key)?)?;
                self.engine.login(tag, email, &key);
            }
            RequestType::Mkdir => {
                let name = required(&request.name)?;
                let parent = self.existing(request.parent_handle)?;
                self.engine.create_folder(tag, parent.handle, name);
            }
            RequestType::Move => {
                let node = self.existing(request.node_handle)?;
                let target = self.existing(request.parent_handle)?;
                if node.parent_handle == Some(target.handle) {
                    return Ok(Submitted::Done);
                }
                let check = self.engine.check_move(node.handle, target.handle);
                if !check.is_ok() {
                    return Err(check);
                }
                self.engine.move_node(tag, node.handle, target.handle)?;
            }
            RequestType::Copy => {
                let node = self.existing(request.node_handle)?;
                let target = self.existing(request.parent_handle)?;
                self.engine.copy_node(tag, node.handle, target.handle)?;
            }
            RequestType::Rename => {
                let node = self.existing(request.node_handle)?;
                let name = required(&request.name)?;
                if !self.engine.check_access(node.handle, AccessLevel::Full) {
                    return Err(ErrorCode::Access);
                }
                self.engine.rename_node(tag, node.handle, name)?;
            }
            RequestType::Remove => {
                let node = self.existing(request.node_handle)?;
                if !self.engine.check_access(node.handle, AccessLevel::Full) {
                    return Err(ErrorCode::Access);
                }
                self.engine.unlink(tag, node.handle)?;
            }
            RequestType::Share => {
                let node = self.existing(request.node_handle)?;
                let email = required(&request.email)?;
                let access = AccessLevel::from_share_str(required(&request.access)?)
                    .ok_or(ErrorCode::Args)?;
                self.engine.set_share(tag, node.handle, email, access);
            }
            RequestType::FolderAccess => {
                let link = parse_folder_link(required(&request.link)?).ok_or(ErrorCode::Args)?;
                self.engine.folder_access(&link.handle, &link.key)?;
                self.engine.fetch_nodes(tag);
            }
            RequestType::ImportLink | RequestType::GetPublicNode => {
                let link = required(&request.link)?;
                if request.request_type == RequestType::ImportLink {
                    self.existing(request.parent_handle)?;
                }
                let link = parse_file_link(link).ok_or(ErrorCode::Args)?;
                self.engine.open_file_link(tag, &link.handle, &link.key)?;
            }
            RequestType::ImportNode => {
                let parent = self.existing(request.parent_handle)?;
                let node = request.public_node.as_ref().ok_or(ErrorCode::Args)?;
                self.engine.put_public_node(tag, Some(parent.handle), node);
            }
            RequestType::Export => {
                let node = self.existing(request.node_handle)?;
                self.engine.export_node(tag, node.handle)?;
            }
            RequestType::FetchNodes => self.engine.fetch_nodes(tag),
            RequestType::AccountDetails => {
                let parts = DetailParts::from_mask(request.num_details);
                request.num_details = parts.expected_replies();
                request.account_details = Some(AccountDetails::default());
                self.engine.account_details(tag, parts);
            }
            RequestType::ChangePassword => {
                let old = required(&request.password)?;
                let new = required(&request.new_password)?;
                let old = self.engine.pw_key(old).map_err(|_| ErrorCode::Args)?;
                let new = self.engine.pw_key(new).map_err(|_| ErrorCode::Args)?;
                self.engine.change_password(tag, &old, &new)?;
            }
            RequestType::Logout => {
                self.close_pending(ErrorCode::Access);
                self.engine.logout();
                return Ok(Submitted::Done);
            }
            RequestType::GetAttrFile => {
                required(&request.file)?;
                let node = self.existing(request.node_handle)?;
                self.engine
                    .get_file_attribute(tag, node.handle, request.attr_type)?;
            }
            RequestType::SetAttrFile => {
                let file = required(&request.file)?;
                let node = self.existing(request.node_handle)?;
                let data = std::fs::read(file).map_err(|e| {
                    debug!("Cannot read attribute file {}: {}", file, e);
                    ErrorCode::Read
                })?;
                self.engine
                    .put_file_attribute(tag, node.handle, request.attr_type, data);
            }
            RequestType::RetryPendingConnections => {
                self.engine.retry_pending_connections();
                return Ok(Submitted::Done);
            }
            RequestType::AddContact => {
                let email = required(&request.email)?;
                self.engine.invite(tag, email);
            }
            RequestType::CreateAccount => {
                required(&request.email)?;
                required(&request.password)?;
                required(&request.name)?;
                self.engine.create_ephemeral(tag);
            }
            RequestType::FastCreateAccount => {
                required(&request.email)?;
                decode_pw_key(required(&request.private_key)?)?;
                required(&request.name)?;
                self.engine.create_ephemeral(tag);
            }
            RequestType::QuerySignupLink
            | RequestType::ConfirmAccount
            | RequestType::FastConfirmAccount => {
                let code = signup_code(required(&request.link)?)?;
                match request.request_type {
                    RequestType::ConfirmAccount => {
                        required(&request.password)?;
                    }
                    RequestType::FastConfirmAccount => {
                        decode_pw_key(required(&request.private_key)?)?;
                    }
                    _ => {}
                }
                self.engine.query_signup_link(tag, &code);
            }
            RequestType::PauseTransfers => {
                self.set_paused(request.flag);
                return Ok(Submitted::Done);
            }
            RequestType::Sync => {
                let local = required(&request.file)?;
                let node = self.existing(request.node_handle)?;
                if node.is_file() {
                    return Err(ErrorCode::Args);
                }
                let local = self.fs.path_to_local(local);
                self.engine.add_sync(&local, node.handle)?;
                return Ok(Submitted::Done);
            }
            // Upload commits are created by the dispatch loop, never queued
            RequestType::Upload => return Err(ErrorCode::Args),
        }
        Ok(Submitted::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base64::base64url_encode;

    #[test]
    fn test_required_rejects_empty() {
        assert_eq!(required(&None), Err(ErrorCode::Args));
        assert_eq!(required(&Some(String::new())), Err(ErrorCode::Args));
        assert_eq!(required(&Some("x".into())), Ok("x"));
    }

    #[test]
    fn test_decode_pw_key() {
        let key = [7u8; 16];
        assert_eq!(decode_pw_key(&base64url_encode(&key)), Ok(key));
        assert_eq!(decode_pw_key(&base64url_encode(&[1u8; 8])), Err(ErrorCode::Args));
        assert_eq!(decode_pw_key("@@@"), Err(ErrorCode::Args));
    }

    #[test]
    fn test_signup_code() {
        let encoded = base64url_encode(b"confirmation");
        assert_eq!(
            signup_code(&format!("https://mega.nz/#confirm{}", encoded)).unwrap(),
            b"confirmation"
        );
        assert_eq!(signup_code(&encoded).unwrap(), b"confirmation");
        assert_eq!(signup_code("https://mega.nz/#confirm"), Err(ErrorCode::Args));
    }
}
