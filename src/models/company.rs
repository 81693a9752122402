/// One Planhat company from the roster fetch.
///
/// `org_id` comes from the custom field "Org ID" and joins the company to
/// rows of the billing export. A company without one is skipped by the sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Company {
    pub planhat_id: String,
    pub org_id: Option<String>,
    pub name: String,
}
