//! Prompt and reply templates
//!
//! Templates use `{name}` placeholders filled by [`fill_template`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Replace every `{key}` in `template` with its value
pub fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{}}}", key), value);
    }
    out
}

const DEFAULT_SYSTEM_PROMPT: &str = r#"You are the assistant of a Thai buffet restaurant's point-of-sale system. Always respond in Thai.
Today's date is {today}. Resolve relative dates ("วันนี้", "เมื่อวาน", "เดือนนี้") against it and write every date as YYYY-MM-DD.

Buffet prices per person:
{price_list}

Classify the user's message into exactly one action and answer ONLY with a JSON object of this shape:
{"action": "<ACTION>", "parameters": {...}, "reply": "<Thai text, optional>"}

Actions:
1. GET_SALES - list all sales. No parameters.
   Examples: "ดูยอดขายทั้งหมด", "ขอดูรายการขาย"
2. ANALYZE_SALES - summarize sales in a date range.
   parameters: {"startDate": "YYYY-MM-DD", "endDate": "YYYY-MM-DD"}
   Examples: "สรุปยอดขายเดือนนี้", "ยอดขายสัปดาห์ที่แล้วเท่าไหร่"
3. ADD_SALE - record a new bill.
   parameters: {"date": "YYYY-MM-DD", "tableNumber": number, "customerCount": number, "buffetType": string, "pricePerPerson": number, "paymentMethod": string}
   Include only the fields the user actually mentioned. Never invent values.
   Examples: "โต๊ะ 5 มา 4 คน บุฟเฟ่ต์พรีเมียม จ่ายเงินสด", "เพิ่มบิลโต๊ะ 3 สองท่าน"
4. UPDATE_SALE - change an existing bill.
   parameters: {"id": number, "updates": {<only the fields to change>}}
   Examples: "แก้บิล 12 เป็นโต๊ะ 5", "บิล 7 ลูกค้าเป็น 3 คน"
5. DELETE_SALE - delete a bill.
   parameters: {"id": number}
   Examples: "ลบบิล 12", "ยกเลิกรายการขาย ID 4"
6. GENERAL_QUERY - greetings and questions about the assistant. Put the Thai answer in "reply".
   Example: {"action": "GENERAL_QUERY", "reply": "สวัสดีค่ะ! ฉันเป็นผู้ช่วยจัดการร้านอาหาร มีอะไรให้ช่วยไหมคะ"}
7. UNKNOWN - anything you cannot map to an action.
   Example: {"action": "UNKNOWN", "reply": "ขออภัยค่ะ ฉันไม่เข้าใจว่าคุณต้องการให้ทำอะไร ช่วยอธิบายอีกครั้งได้ไหมคะ"}

Rules:
- Output JSON only, no explanations.
- Numbers must be JSON numbers, not strings.
- Keep buffetType as the user said it (e.g. "พรีเมียม" or "premium")."#;

/// Classifier system prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemPromptConfig {
    /// Template with `{today}` and `{price_list}` placeholders
    pub template: String,
}

impl Default for SystemPromptConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl SystemPromptConfig {
    pub fn render(&self, today: NaiveDate, price_list: &str) -> String {
        let today = today.format("%Y-%m-%d").to_string();
        fill_template(
            &self.template,
            &[("today", today.as_str()), ("price_list", price_list)],
        )
    }
}

/// Localized replies produced by the dialogue manager and dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseTemplates {
    /// Lower-cased prefixes that count as "yes" during confirmation
    pub affirmative_tokens: Vec<String>,
    /// `{fields}`
    pub missing_fields_initial: String,
    /// `{fields}`
    pub missing_fields_followup: String,
    /// `{field}`
    pub invalid_number: String,
    /// `{field}`
    pub invalid_value: String,
    /// `{date}`, `{table_number}`, `{customer_count}`, `{buffet_type}`,
    /// `{price_per_person}`, `{payment_method}`, `{total_amount}`
    pub add_confirmation: String,
    /// `{id}`, `{changes}`
    pub update_confirmation: String,
    /// `{id}`
    pub update_confirmation_no_changes: String,
    /// `{id}`
    pub delete_confirmation: String,
    /// `{id}`
    pub add_success: String,
    /// `{id}`
    pub update_success: String,
    /// `{id}`
    pub delete_success: String,
    /// `{id}`
    pub not_found: String,
    /// `{detail}`
    pub action_failed: String,
    pub cancelled: String,
    pub sales_list_header: String,
    pub no_sales: String,
    /// `{start}`, `{end}`, `{bills}`, `{customers}`, `{revenue}`
    pub analysis_summary: String,
    /// `{start}`, `{end}`
    pub analysis_empty: String,
    pub fallback: String,
    pub empty_message: String,
    pub system_error: String,
}

impl Default for ResponseTemplates {
    fn default() -> Self {
        Self {
            affirmative_tokens: vec!["ใช่".to_string(), "yes".to_string()],
            missing_fields_initial: "ได้เลยค่ะ แต่ยังขาดข้อมูล: {fields} ค่ะ".to_string(),
            missing_fields_followup: "ขอบคุณค่ะ ยังขาดข้อมูล: {fields} ค่ะ".to_string(),
            invalid_number: "ขออภัยค่ะ ฉันคาดหวังตัวเลขสำหรับ {field} แต่ได้รับข้อความที่ไม่ใช่ตัวเลข กรุณาลองอีกครั้งค่ะ".to_string(),
            invalid_value: "ขออภัยค่ะ กรุณาระบุ {field} อีกครั้งค่ะ".to_string(),
            add_confirmation: "รับทราบค่ะ: วันที่ {date}, โต๊ะ {table_number}, {customer_count} ท่าน, บุฟเฟ่ต์ {buffet_type} (ราคา {price_per_person} บาท/ท่าน), ชำระเงินด้วย {payment_method} รวมเป็นเงิน {total_amount} บาท ถูกต้องไหมคะ? (ใช่/ไม่)".to_string(),
            update_confirmation: "คุณต้องการอัปเดตบิล ID {id} ดังนี้: {changes} ใช่ไหมคะ? (ใช่/ไม่)".to_string(),
            update_confirmation_no_changes: "คุณต้องการจะอัปเดตข้อมูลสำหรับบิล ID {id} ใช่ไหมคะ? กรุณาระบุข้อมูลที่ต้องการแก้ไขค่ะ (เช่น \"เปลี่ยนเป็นโต๊ะ 5\" หรือ \"ลูกค้าเป็น 3 คน\")".to_string(),
            delete_confirmation: "คุณยืนยันที่จะลบรายการขาย ID {id} ใช่หรือไม่? การกระทำนี้ไม่สามารถย้อนกลับได้ค่ะ (ใช่/ไม่)".to_string(),
            add_success: "เพิ่มรายการขาย ID {id} เรียบร้อยแล้วค่ะ".to_string(),
            update_success: "อัปเดตรายการขาย ID {id} เรียบร้อยแล้วค่ะ".to_string(),
            delete_success: "ลบรายการขาย ID {id} เรียบร้อยแล้วค่ะ".to_string(),
            not_found: "เกิดข้อผิดพลาด: ไม่พบรายการขาย ID {id} ค่ะ".to_string(),
            action_failed: "เกิดข้อผิดพลาด: {detail}".to_string(),
            cancelled: "ยกเลิกการดำเนินการแล้วค่ะ".to_string(),
            sales_list_header: "นี่คือข้อมูลการขายทั้งหมดค่ะ:".to_string(),
            no_sales: "ไม่พบข้อมูลการขายค่ะ".to_string(),
            analysis_summary: "สรุปยอดขายระหว่างวันที่ {start} ถึง {end}:\n- จำนวนบิล: {bills} บิล\n- จำนวนลูกค้าทั้งหมด: {customers} ท่าน\n- ยอดขายรวม: {revenue} บาท".to_string(),
            analysis_empty: "ไม่พบข้อมูลการขายในช่วงวันที่ {start} ถึง {end} ค่ะ".to_string(),
            fallback: "ขออภัยค่ะ ฉันไม่เข้าใจคำสั่ง ลองใหม่อีกครั้งนะคะ".to_string(),
            empty_message: "กรุณาพิมพ์ข้อความที่ต้องการค่ะ".to_string(),
            system_error: "ขออภัยค่ะ เกิดข้อผิดพลาดร้ายแรงในระบบ".to_string(),
        }
    }
}

impl ResponseTemplates {
    /// Whether a confirmation answer counts as "yes"
    pub fn is_affirmative(&self, answer: &str) -> bool {
        let answer = answer.trim_start().to_lowercase();
        self.affirmative_tokens
            .iter()
            .map(|t| t.trim().to_lowercase())
            .any(|t| !t.is_empty() && answer.starts_with(&t))
    }
}
