//! Protected resources
//!
//! A [`Resource`] is identified by its [`ResourceId`] (layer tag plus business
//! key); equality and hashing use the id only. The [`ResourceDetail`] carries
//! the per-request data the layer-specific policy modules evaluate.

use crate::permission::CompositeAclPermission;
use crate::role::RoleGroup;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Layer a resource belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Enterprise bean method invocation
    Ejb,
    /// Web request
    Web,
    /// ACL-protected business object
    Acl,
    /// Application-defined layer
    Custom(String),
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ejb => f.write_str("ejb"),
            Self::Web => f.write_str("web"),
            Self::Acl => f.write_str("acl"),
            Self::Custom(tag) => f.write_str(tag),
        }
    }
}

/// Stable identity of a resource: layer tag plus business key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId {
    kind: ResourceKind,
    key: String,
}

impl ResourceId {
    /// Create a resource id
    pub fn new(kind: ResourceKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }

    /// Layer tag
    pub fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    /// Business key
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.key)
    }
}

/// Maps a role name used in code to the role name declared by the deployment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecurityRoleRef {
    /// Role name used by the component code
    pub name: String,
    /// Deployed role the name links to
    pub link: String,
    /// Optional description from the deployment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SecurityRoleRef {
    /// Create a role reference
    pub fn new(name: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link: link.into(),
            description: None,
        }
    }
}

/// Find the deployed role linked from a code-level role name
pub fn resolve_role_link<'a>(refs: &'a [SecurityRoleRef], role_name: &str) -> Option<&'a str> {
    refs.iter()
        .find(|role_ref| role_ref.name == role_name)
        .map(|role_ref| role_ref.link.as_str())
}

/// A programmatic "is caller in role" check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRefCheck {
    /// Role name as used by the component code
    pub role_name: String,
    /// Deployed role substituted for `role_name`, once resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_role: Option<String>,
}

impl RoleRefCheck {
    /// Unresolved check for a code-level role name
    pub fn new(role_name: impl Into<String>) -> Self {
        Self {
            role_name: role_name.into(),
            linked_role: None,
        }
    }

    /// Role the caller must hold: the linked role if resolved, else the
    /// code-level name
    pub fn effective_role(&self) -> &str {
        self.linked_role.as_deref().unwrap_or(&self.role_name)
    }
}

/// Transport guarantee declared by a web user-data constraint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransportGuarantee {
    /// No transport requirement
    #[default]
    None,
    /// Data must not be altered in transit
    Integral,
    /// Data must not be observable in transit
    Confidential,
}

/// EJB method invocation being authorized
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EjbInvocation {
    /// Name of the bean
    pub bean_name: String,
    /// Invoked method, if this is a method invocation
    pub method_name: Option<String>,
    /// Interface the method was invoked through (`Remote`, `Local`, ...)
    pub method_interface: Option<String>,
    /// Roles permitted to invoke the method
    pub method_roles: RoleGroup,
    /// Method is callable by everyone
    pub unchecked: bool,
    /// Method is callable by no one
    pub excluded: bool,
    /// Programmatic role check, instead of a method permission check
    pub role_ref: Option<RoleRefCheck>,
    /// Role references declared for the bean
    pub security_role_refs: Vec<SecurityRoleRef>,
}

impl EjbInvocation {
    /// Invocation on a bean, with no method roles yet
    pub fn new(bean_name: impl Into<String>) -> Self {
        Self {
            bean_name: bean_name.into(),
            method_roles: RoleGroup::new("MethodRoles"),
            ..Self::default()
        }
    }

    /// Set the invoked method
    pub fn method(mut self, method_name: impl Into<String>) -> Self {
        self.method_name = Some(method_name.into());
        self
    }

    /// Set the invocation interface
    pub fn interface(mut self, interface: impl Into<String>) -> Self {
        self.method_interface = Some(interface.into());
        self
    }

    /// Set the method roles
    pub fn method_roles(mut self, roles: RoleGroup) -> Self {
        self.method_roles = roles;
        self
    }

    /// Mark the method unchecked
    pub fn unchecked(mut self) -> Self {
        self.unchecked = true;
        self
    }

    /// Mark the method excluded
    pub fn excluded(mut self) -> Self {
        self.excluded = true;
        self
    }

    /// Request an `isCallerInRole` check
    pub fn role_ref_check(mut self, role_name: impl Into<String>) -> Self {
        self.role_ref = Some(RoleRefCheck::new(role_name));
        self
    }

    /// Declare a role reference for the bean
    pub fn security_role_ref(mut self, role_ref: SecurityRoleRef) -> Self {
        self.security_role_refs.push(role_ref);
        self
    }
}

/// Web request being authorized
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebRequest {
    /// Request URI
    pub uri: String,
    /// HTTP method
    pub http_method: String,
    /// Roles permitted by the matching security constraint
    pub required_roles: RoleGroup,
    /// No authorization constraint applies
    pub unchecked: bool,
    /// The matching constraint excludes all access
    pub excluded: bool,
    /// Transport guarantee of the matching user-data constraint
    pub transport_guarantee: TransportGuarantee,
    /// Whether the request arrived over a secure channel
    pub secure: bool,
    /// Programmatic role check (`isUserInRole`)
    pub role_ref: Option<RoleRefCheck>,
    /// Role references declared for the servlet
    pub security_role_refs: Vec<SecurityRoleRef>,
}

impl WebRequest {
    /// Request with no constraints yet
    pub fn new(http_method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            http_method: http_method.into(),
            required_roles: RoleGroup::new("RequiredRoles"),
            ..Self::default()
        }
    }

    /// Set the roles permitted by the constraint
    pub fn required_roles(mut self, roles: RoleGroup) -> Self {
        self.required_roles = roles;
        self
    }

    /// Mark the request unconstrained
    pub fn unchecked(mut self) -> Self {
        self.unchecked = true;
        self
    }

    /// Mark the request excluded
    pub fn excluded(mut self) -> Self {
        self.excluded = true;
        self
    }

    /// Set the transport guarantee and whether the request is secure
    pub fn transport(mut self, guarantee: TransportGuarantee, secure: bool) -> Self {
        self.transport_guarantee = guarantee;
        self.secure = secure;
        self
    }

    /// Request an `isUserInRole` check
    pub fn role_ref_check(mut self, role_name: impl Into<String>) -> Self {
        self.role_ref = Some(RoleRefCheck::new(role_name));
        self
    }

    /// Declare a role reference for the servlet
    pub fn security_role_ref(mut self, role_ref: SecurityRoleRef) -> Self {
        self.security_role_refs.push(role_ref);
        self
    }
}

/// Access to an ACL-protected object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclRequest {
    /// Permission the caller asks for
    pub permission: CompositeAclPermission,
}

/// Layer-specific request data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceDetail {
    /// No layer-specific data
    #[default]
    Generic,
    /// EJB invocation
    Ejb(EjbInvocation),
    /// Web request
    Web(WebRequest),
    /// ACL access
    Acl(AclRequest),
}

/// A protected resource plus the request data evaluated against it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    id: ResourceId,
    #[serde(default)]
    detail: ResourceDetail,
    #[serde(default)]
    attributes: BTreeMap<String, String>,
}

impl Resource {
    /// Resource with no layer-specific data
    pub fn new(id: ResourceId) -> Self {
        Self {
            id,
            detail: ResourceDetail::Generic,
            attributes: BTreeMap::new(),
        }
    }

    /// EJB resource keyed by bean name
    pub fn ejb(invocation: EjbInvocation) -> Self {
        let key = match &invocation.method_name {
            Some(method) => format!("{}#{method}", invocation.bean_name),
            None => invocation.bean_name.clone(),
        };
        Self {
            id: ResourceId::new(ResourceKind::Ejb, key),
            detail: ResourceDetail::Ejb(invocation),
            attributes: BTreeMap::new(),
        }
    }

    /// Web resource keyed by URI
    pub fn web(request: WebRequest) -> Self {
        Self {
            id: ResourceId::new(ResourceKind::Web, request.uri.clone()),
            detail: ResourceDetail::Web(request),
            attributes: BTreeMap::new(),
        }
    }

    /// ACL-protected resource with a requested permission
    pub fn acl(id: ResourceId, permission: CompositeAclPermission) -> Self {
        Self {
            id,
            detail: ResourceDetail::Acl(AclRequest { permission }),
            attributes: BTreeMap::new(),
        }
    }

    /// Attach a free-form attribute (used for audit context)
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Resource identity
    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    /// Layer tag
    pub fn kind(&self) -> &ResourceKind {
        self.id.kind()
    }

    /// Layer-specific request data
    pub fn detail(&self) -> &ResourceDetail {
        &self.detail
    }

    /// Mutable layer-specific request data
    pub fn detail_mut(&mut self) -> &mut ResourceDetail {
        &mut self.detail
    }

    /// Free-form attributes
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// The programmatic role check and declared role refs, if any
    pub fn role_ref(&self) -> Option<(&RoleRefCheck, &[SecurityRoleRef])> {
        match &self.detail {
            ResourceDetail::Ejb(ejb) => ejb
                .role_ref
                .as_ref()
                .map(|check| (check, ejb.security_role_refs.as_slice())),
            ResourceDetail::Web(web) => web
                .role_ref
                .as_ref()
                .map(|check| (check, web.security_role_refs.as_slice())),
            ResourceDetail::Generic | ResourceDetail::Acl(_) => None,
        }
    }

    /// Record the deployed role substituted for the programmatic role check
    pub fn link_role_ref(&mut self, linked_role: impl Into<String>) {
        let check = match &mut self.detail {
            ResourceDetail::Ejb(ejb) => ejb.role_ref.as_mut(),
            ResourceDetail::Web(web) => web.role_ref.as_mut(),
            ResourceDetail::Generic | ResourceDetail::Acl(_) => None,
        };
        if let Some(check) = check {
            check.linked_role = Some(linked_role.into());
        }
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Resource {}

impl Hash for Resource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.id.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn equality_uses_identity_only() {
        let id = ResourceId::new(ResourceKind::Acl, "invoice-17");
        let read = Resource::acl(id.clone(), CompositeAclPermission::READ);
        let write = Resource::acl(id, CompositeAclPermission::UPDATE).with_attribute("k", "v");
        assert_eq!(read, write);

        let mut set = HashSet::new();
        set.insert(read);
        assert!(!set.insert(write));
    }

    #[test]
    fn ejb_key_includes_method() {
        let resource = Resource::ejb(EjbInvocation::new("Ledger").method("post"));
        assert_eq!(resource.id().to_string(), "ejb:Ledger#post");
        assert_eq!(resource.kind(), &ResourceKind::Ejb);
    }

    #[test]
    fn role_ref_linking() {
        let mut resource = Resource::ejb(
            EjbInvocation::new("Ledger")
                .role_ref_check("roleLink")
                .security_role_ref(SecurityRoleRef::new("roleLink", "roleA")),
        );
        let (check, refs) = resource.role_ref().unwrap();
        assert_eq!(check.effective_role(), "roleLink");
        assert_eq!(resolve_role_link(refs, "roleLink"), Some("roleA"));
        assert_eq!(resolve_role_link(refs, "other"), None);

        resource.link_role_ref("roleA");
        let (check, _) = resource.role_ref().unwrap();
        assert_eq!(check.effective_role(), "roleA");
    }

    #[test]
    fn generic_resources_have_no_role_ref() {
        let resource = Resource::new(ResourceId::new(ResourceKind::Custom("queue".into()), "jobs"));
        assert!(resource.role_ref().is_none());
        assert_eq!(resource.to_string(), "queue:jobs");
    }
}
