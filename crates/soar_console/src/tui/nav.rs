use super::app::View;

#[derive(Debug, Clone, Copy)]
pub struct NavItem {
    pub key: char,
    pub label: &'static str,
    pub description: &'static str,
    pub view: View,
}

pub const NAV_ITEMS: &[NavItem] = &[
    NavItem {
        key: '1',
        label: "Dashboard",
        description: "Security operations overview",
        view: View::Dashboard,
    },
    NavItem {
        key: '2',
        label: "Cases",
        description: "All security cases",
        view: View::Cases,
    },
    NavItem {
        key: '3',
        label: "Scanner",
        description: "Submit a file for malware analysis",
        view: View::Scanner,
    },
    NavItem {
        key: '4',
        label: "Control",
        description: "Response mode and automation rules",
        view: View::Control,
    },
    NavItem {
        key: '5',
        label: "Approvals",
        description: "Remediation waiting for an analyst",
        view: View::Approvals,
    },
    NavItem {
        key: '6',
        label: "Logs",
        description: "Audit trail of SOAR actions",
        view: View::Logs,
    },
];

pub fn nav_view_for_key(key: char) -> Option<View> {
    NAV_ITEMS.iter().find(|item| item.key == key).map(|item| item.view)
}

pub fn nav_item_for_view(view: View) -> Option<&'static NavItem> {
    NAV_ITEMS.iter().find(|item| item.view == view)
}
