//! Listener-facing request records.

use std::fmt;
use std::sync::Arc;

use crate::engine::Tag;
use crate::fs::{AccountDetails, Handle};
use crate::listener::RequestListener;
use crate::public::PublicNode;
use crate::transfer::Transfer;

/// Kind of control operation a [`Request`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestType {
    Login,
    Mkdir,
    Move,
    Copy,
    Rename,
    Remove,
    Share,
    FolderAccess,
    ImportLink,
    ImportNode,
    Export,
    FetchNodes,
    AccountDetails,
    ChangePassword,
    /// Commit of a finished upload.
    Upload,
    Logout,
    FastLogin,
    GetPublicNode,
    GetAttrFile,
    SetAttrFile,
    RetryPendingConnections,
    AddContact,
    CreateAccount,
    FastCreateAccount,
    ConfirmAccount,
    FastConfirmAccount,
    QuerySignupLink,
    PauseTransfers,
    Sync,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Login => "login",
            RequestType::Mkdir => "mkdir",
            RequestType::Move => "move",
            RequestType::Copy => "copy",
            RequestType::Rename => "rename",
            RequestType::Remove => "remove",
            RequestType::Share => "share",
            RequestType::FolderAccess => "folderaccess",
            RequestType::ImportLink => "importlink",
            RequestType::ImportNode => "importnode",
            RequestType::Export => "export",
            RequestType::FetchNodes => "fetchnodes",
            RequestType::AccountDetails => "accountdetails",
            RequestType::ChangePassword => "changepw",
            RequestType::Upload => "upload",
            RequestType::Logout => "logout",
            RequestType::FastLogin => "fastlogin",
            RequestType::GetPublicNode => "getpublicnode",
            RequestType::GetAttrFile => "getattrfile",
            RequestType::SetAttrFile => "setattrfile",
            RequestType::RetryPendingConnections => "retrypending",
            RequestType::AddContact => "addcontact",
            RequestType::CreateAccount => "createaccount",
            RequestType::FastCreateAccount => "fastcreateaccount",
            RequestType::ConfirmAccount => "confirmaccount",
            RequestType::FastConfirmAccount => "fastconfirmaccount",
            RequestType::QuerySignupLink => "querysignuplink",
            RequestType::PauseTransfers => "pausetransfers",
            RequestType::Sync => "sync",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One control operation, from enqueue until its finish notification.
///
/// Only the fields meaningful for the request's type are set.
#[derive(Clone)]
pub struct Request {
    pub(crate) request_type: RequestType,
    pub(crate) tag: Option<Tag>,
    pub(crate) node_handle: Option<Handle>,
    pub(crate) parent_handle: Option<Handle>,
    pub(crate) link: Option<String>,
    pub(crate) name: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) password: Option<String>,
    pub(crate) new_password: Option<String>,
    pub(crate) private_key: Option<String>,
    pub(crate) access: Option<String>,
    pub(crate) file: Option<String>,
    pub(crate) attr_type: u32,
    pub(crate) num_retry: u32,
    pub(crate) next_retry_delay: u32,
    pub(crate) num_details: u32,
    pub(crate) flag: bool,
    pub(crate) public_node: Option<PublicNode>,
    pub(crate) account_details: Option<AccountDetails>,
    pub(crate) transfer: Option<Box<Transfer>>,
    pub(crate) listener: Option<Arc<dyn RequestListener>>,
}

impl Request {
    pub fn new(request_type: RequestType) -> Self {
        Self {
            request_type,
            tag: None,
            node_handle: None,
            parent_handle: None,
            link: None,
            name: None,
            email: None,
            password: None,
            new_password: None,
            private_key: None,
            access: None,
            file: None,
            attr_type: 0,
            num_retry: 0,
            next_retry_delay: 0,
            num_details: 0,
            flag: false,
            public_node: None,
            account_details: None,
            transfer: None,
            listener: None,
        }
    }

    pub(crate) fn with_listener(mut self, listener: Option<Arc<dyn RequestListener>>) -> Self {
        self.listener = listener;
        self
    }

    pub fn request_type(&self) -> RequestType {
        self.request_type
    }

    /// Tag the request is currently filed under.
    ///
    /// Changes when the request is chained into a follow-up engine call.
    pub fn tag(&self) -> Option<Tag> {
        self.tag
    }

    pub fn node_handle(&self) -> Option<Handle> {
        self.node_handle
    }

    pub fn parent_handle(&self) -> Option<Handle> {
        self.parent_handle
    }

    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn new_password(&self) -> Option<&str> {
        self.new_password.as_deref()
    }

    pub fn private_key(&self) -> Option<&str> {
        self.private_key.as_deref()
    }

    pub fn access(&self) -> Option<&str> {
        self.access.as_deref()
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn attr_type(&self) -> u32 {
        self.attr_type
    }

    pub fn num_retry(&self) -> u32 {
        self.num_retry
    }

    pub fn next_retry_delay(&self) -> u32 {
        self.next_retry_delay
    }

    /// Account detail mask before submission, pending reply count after.
    pub fn num_details(&self) -> u32 {
        self.num_details
    }

    pub fn flag(&self) -> bool {
        self.flag
    }

    pub fn public_node(&self) -> Option<&PublicNode> {
        self.public_node.as_ref()
    }

    pub fn account_details(&self) -> Option<&AccountDetails> {
        self.account_details.as_ref()
    }

    /// Transfer being committed by an upload request.
    pub fn transfer(&self) -> Option<&Transfer> {
        self.transfer.as_deref()
    }

    pub fn listener(&self) -> Option<&Arc<dyn RequestListener>> {
        self.listener.as_ref()
    }

    /// Attach an owned copy of `node`, or drop the current one.
    pub fn set_public_node(&mut self, node: Option<&PublicNode>) {
        self.public_node = node.cloned();
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("type", &self.request_type)
            .field("tag", &self.tag)
            .field("node_handle", &self.node_handle)
            .field("parent_handle", &self.parent_handle)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("link", &self.link)
            .field("file", &self.file)
            .field("has_listener", &self.listener.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_type_names() {
        assert_eq!(RequestType::Login.to_string(), "login");
        assert_eq!(RequestType::Mkdir.to_string(), "mkdir");
        assert_eq!(RequestType::ChangePassword.to_string(), "changepw");
        assert_eq!(RequestType::GetAttrFile.to_string(), "getattrfile");
        assert_eq!(RequestType::Sync.as_str(), "sync");
    }

    #[test]
    fn test_public_node_attach_copies() {
        let mut node = PublicNode::new_file(5, Some(vec![7; 32]), Some("a.txt".into()), 10, vec![]);
        let mut request = Request::new(RequestType::ImportNode);
        request.set_public_node(Some(&node));

        node = PublicNode::new_file(6, None, None, 0, vec![]);
        assert_eq!(request.public_node().map(|n| n.handle()), Some(5));
        assert_eq!(node.handle(), 6);

        let cloned = request.clone();
        request.set_public_node(None);
        assert!(request.public_node().is_none());
        assert_eq!(cloned.public_node().map(|n| n.name()), Some("a.txt"));
    }

    #[test]
    fn test_new_request_is_empty() {
        let request = Request::new(RequestType::FetchNodes);
        assert_eq!(request.request_type(), RequestType::FetchNodes);
        assert!(request.tag().is_none());
        assert!(request.node_handle().is_none());
        assert!(request.transfer().is_none());
        assert!(!request.flag());
    }
}
