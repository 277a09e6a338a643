use crate::domain::ledger::{Ledger, LedgerEntry as DomainLedgerEntry};
use crate::domain::ledger_service::LedgerView;
use crate::domain::models::bill::{format_bill_date, Bill as DomainBill, BillCategory as DomainBillCategory};
use shared::{
    Bill as SharedBill, BillCategory as SharedBillCategory, LedgerEntry as SharedLedgerEntry,
    LedgerResponse,
};

pub struct BillMapper;

impl BillMapper {
    pub fn to_dto(domain: DomainBill) -> SharedBill {
        SharedBill {
            date: format_bill_date(domain.date),
            id: domain.id,
            description: domain.description,
            category: Self::to_dto_category(domain.category),
            value: domain.value,
        }
    }

    pub fn to_domain_category(dto_category: SharedBillCategory) -> DomainBillCategory {
        match dto_category {
            SharedBillCategory::Expense => DomainBillCategory::Expense,
            SharedBillCategory::Income => DomainBillCategory::Income,
        }
    }

    pub fn to_dto_category(domain_category: DomainBillCategory) -> SharedBillCategory {
        match domain_category {
            DomainBillCategory::Expense => SharedBillCategory::Expense,
            DomainBillCategory::Income => SharedBillCategory::Income,
        }
    }

    pub fn entry_to_dto(entry: DomainLedgerEntry) -> SharedLedgerEntry {
        SharedLedgerEntry {
            bill_id: entry.bill_id,
            date: format_bill_date(entry.date),
            description: entry.description,
            category: Self::to_dto_category(entry.category),
            value: entry.value,
            running_balance: entry.running_balance,
        }
    }

    pub fn ledger_to_response(view: LedgerView) -> LedgerResponse {
        let Ledger { entries, total } = view.ledger;
        LedgerResponse {
            entries: entries.into_iter().map(Self::entry_to_dto).collect(),
            total,
            version: view.version,
            last_error: view.last_error,
        }
    }
}
