use crate::persist::Session;

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    LoadCatalog,
    LoadStats { id: u16 },
    RevealToast { generation: u64 },
    DismissToastAfter { generation: u64, after_ms: u64 },
    SaveSession(Session),
}
