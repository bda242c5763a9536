use serde::{Deserialize, Serialize};
use std::fmt;

/// A logical attribute, decoupled from whatever text a spreadsheet uses as the
/// column header for it.
///
/// The alias lists below are the built-in registry consulted by
/// [`crate::schema::alias::AliasRegistry`], kept in the spelling found in real
/// sheets and normalized when the registry is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    AssetNumber,
    HolderId,
    HolderName,
    Department,
    ModelName,
    SerialNumber,
    Category,
    State,
    Status,
    InspectionTime,
    Note,
    Date,
    PriorHolderId,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 13] = [
        CanonicalField::AssetNumber,
        CanonicalField::HolderId,
        CanonicalField::HolderName,
        CanonicalField::Department,
        CanonicalField::ModelName,
        CanonicalField::SerialNumber,
        CanonicalField::Category,
        CanonicalField::State,
        CanonicalField::Status,
        CanonicalField::InspectionTime,
        CanonicalField::Note,
        CanonicalField::Date,
        CanonicalField::PriorHolderId,
    ];

    /// Column name used when this field has to be written as a new column.
    pub fn name(self) -> &'static str {
        match self {
            CanonicalField::AssetNumber => "asset_number",
            CanonicalField::HolderId => "holder_id",
            CanonicalField::HolderName => "holder_name",
            CanonicalField::Department => "department",
            CanonicalField::ModelName => "model_name",
            CanonicalField::SerialNumber => "serial_number",
            CanonicalField::Category => "category",
            CanonicalField::State => "state",
            CanonicalField::Status => "status",
            CanonicalField::InspectionTime => "inspection_time",
            CanonicalField::Note => "note",
            CanonicalField::Date => "date",
            CanonicalField::PriorHolderId => "prior_holder_id",
        }
    }

    pub fn default_aliases(self) -> &'static [&'static str] {
        match self {
            CanonicalField::AssetNumber => {
                &["assetnumber", "자산번호", "관리번호", "assetno", "no", "관리no"]
            }
            CanonicalField::HolderId => &[
                "inuser", "사용자id", "사번", "id", "cjid", "user_id", "인사번호", "in_user",
            ],
            CanonicalField::HolderName => {
                &["username", "사용자", "성함", "성명", "이름", "name", "user"]
            }
            CanonicalField::Department => {
                &["department", "부서", "소속", "part", "팀", "팀명", "부서명"]
            }
            CanonicalField::ModelName => &[
                "modelname", "모델명", "모델", "품명", "자산명", "기종", "모델코드", "model",
            ],
            CanonicalField::SerialNumber => {
                &["serialnumber", "sn", "s/n", "시리얼", "제조번호", "serial_number"]
            }
            CanonicalField::Category => &["category", "카테고리", "분류", "자산분류"],
            CanonicalField::State => &["state", "상태", "구분", "자산구분"],
            CanonicalField::Status => &["status", "실사상태", "진행상태"],
            CanonicalField::InspectionTime => &["inspectiontime", "실사시간", "점검시간", "시간"],
            CanonicalField::Note => &["note", "메모", "비고", "사항"],
            CanonicalField::Date => &["date", "업무일자", "일자", "날짜", "timestamp"],
            CanonicalField::PriorHolderId => &[
                "ex_user",
                "이전에사용하던사람",
                "이전사용자",
                "asset_in_user",
                "prev_user",
            ],
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
