//! Pre-formatted view data for back office templates.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use delicias_core::{AdminRole, ApprovalStatus, OrderStatus, format_clp};

use crate::models::{CurrentAdmin, Order, OrderSummary, Profile, Socio};

/// Admin user view for templates.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
    pub role: AdminRole,
    pub is_super_admin: bool,
    /// Viewers see no action buttons.
    pub can_write: bool,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.name.clone(),
            email: admin.email.to_string(),
            role: admin.role,
            is_super_admin: admin.role == AdminRole::SuperAdmin,
            can_write: admin.can_write(),
        }
    }
}

/// One tab of a status filter (`?estado=`).
#[derive(Debug, Clone)]
pub struct FilterTab {
    /// Query value; empty for "all".
    pub value: &'static str,
    pub label: &'static str,
    pub active: bool,
}

/// Tabs for approval-status lists, with `include_all` adding a "Todos" tab.
#[must_use]
pub fn approval_tabs(current: Option<ApprovalStatus>, include_all: bool) -> Vec<FilterTab> {
    let all = include_all.then(|| FilterTab {
        value: "",
        label: "Todos",
        active: current.is_none(),
    });
    all.into_iter()
        .chain(ApprovalStatus::ALL.into_iter().map(|status| FilterTab {
            value: status.as_str(),
            label: status.label(),
            active: current == Some(status),
        }))
        .collect()
}

/// Tabs for the order list.
#[must_use]
pub fn order_tabs(current: Option<OrderStatus>) -> Vec<FilterTab> {
    std::iter::once(FilterTab {
        value: "",
        label: "Todos",
        active: current.is_none(),
    })
    .chain(OrderStatus::ALL.into_iter().map(|status| FilterTab {
        value: status.as_str(),
        label: status.label(),
        active: current == Some(status),
    }))
    .collect()
}

/// A buyer account in the review queue.
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub id: String,
    pub business_name: String,
    pub rut: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub email_verified: bool,
    pub status: ApprovalStatus,
    pub registered_on: String,
    pub reviewed_on: Option<String>,
}

impl From<&Profile> for ProfileView {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id.to_string(),
            business_name: profile.business_name.clone(),
            rut: profile.rut.clone(),
            contact_name: profile.contact_name.clone(),
            email: profile.email.to_string(),
            phone: profile.phone.clone(),
            location: format!("{}, {}, {}", profile.address, profile.comuna, profile.city),
            email_verified: profile.email_verified,
            status: profile.approval_status,
            registered_on: format_date(profile.created_at),
            reviewed_on: profile.reviewed_at.map(format_date),
        }
    }
}

/// A distributor listing row.
#[derive(Debug, Clone)]
pub struct SocioView {
    pub id: String,
    pub name: String,
    pub address: String,
    pub comuna: String,
    pub region: String,
    pub contact: Vec<String>,
    /// `lat, lng` with 5 decimals, once geocoded.
    pub coordinates: Option<String>,
    pub status: ApprovalStatus,
    pub is_public: bool,
    pub is_listed: bool,
}

impl From<&Socio> for SocioView {
    fn from(socio: &Socio) -> Self {
        let contact = [&socio.phone, &socio.email, &socio.instagram]
            .into_iter()
            .flatten()
            .cloned()
            .collect();

        Self {
            id: socio.id.to_string(),
            name: socio.name.clone(),
            address: socio.address.clone(),
            comuna: socio.comuna.clone(),
            region: socio.region.clone(),
            contact,
            coordinates: socio
                .location
                .map(|c| format!("{:.5}, {:.5}", c.latitude(), c.longitude())),
            status: socio.status,
            is_public: socio.is_public,
            is_listed: socio.is_listed(),
        }
    }
}

/// One row of the order list.
#[derive(Debug, Clone)]
pub struct OrderRowView {
    pub id: String,
    pub business_name: String,
    pub comuna: String,
    pub total_units: u32,
    pub total: String,
    pub status: OrderStatus,
    pub placed_on: String,
}

impl From<&OrderSummary> for OrderRowView {
    fn from(summary: &OrderSummary) -> Self {
        Self {
            id: summary.id.to_string(),
            business_name: summary.business_name.clone(),
            comuna: summary.comuna.clone(),
            total_units: summary.total_units,
            total: format_clp(summary.total),
            status: summary.status,
            placed_on: format_date(summary.created_at),
        }
    }
}

/// One order line, pre-formatted.
#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub sku: String,
    pub name: String,
    pub unit_label: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

/// A stored order rendered from its payload.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub number: String,
    pub status: OrderStatus,
    pub placed_on: String,
    pub updated_on: String,
    pub business_name: String,
    pub rut: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub delivery_address: String,
    pub lines: Vec<OrderLineView>,
    pub total_units: u32,
    pub tier: usize,
    pub subtotal: String,
    pub tax: String,
    pub total: String,
    pub savings: Option<String>,
    pub notes: Option<String>,
    /// Statuses the order may move to next.
    pub next_statuses: Vec<OrderStatus>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        let payload = &order.payload;
        let business = &payload.business;
        let totals = &payload.totals;

        Self {
            number: order.id.to_string(),
            status: order.status,
            placed_on: format_date(order.created_at),
            updated_on: format_date(order.updated_at),
            business_name: business.business_name.clone(),
            rut: business.rut.clone(),
            contact_name: business.contact_name.clone(),
            email: business.email.clone(),
            phone: business.phone.clone(),
            delivery_address: format!(
                "{}, {}, {}",
                business.address, business.comuna, business.city
            ),
            lines: payload
                .lines
                .iter()
                .map(|line| OrderLineView {
                    sku: line.sku.clone(),
                    name: line.name.clone(),
                    unit_label: line.unit_label.clone(),
                    quantity: line.quantity,
                    unit_price: format_clp(line.unit_price),
                    line_total: format_clp(line.line_total),
                })
                .collect(),
            total_units: totals.total_units,
            tier: totals.tier,
            subtotal: format_clp(totals.subtotal),
            tax: format_clp(totals.tax),
            total: format_clp(totals.total),
            savings: (totals.savings > Decimal::ZERO).then(|| format_clp(totals.savings)),
            notes: order.notes.clone(),
            next_statuses: order.status.next_statuses(),
        }
    }
}

/// `dd-mm-yyyy HH:MM` in UTC.
#[must_use]
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%d-%m-%Y %H:%M").to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use delicias_core::{
        AdminUserId, BusinessSnapshot, Cart, Coordinates, Email, OrderId, OrderPayload, ProfileId,
        SocioId, calculate_totals,
    };

    use super::*;

    pub(crate) fn order(status: OrderStatus) -> Order {
        let mut cart = Cart::new();
        cart.add("ALF-MAI-12", 12).unwrap();
        let totals = calculate_totals(&cart).unwrap();
        let business = BusinessSnapshot {
            business_name: "Cafetería Aroma".to_owned(),
            rut: "76.000.111-2".to_owned(),
            contact_name: "Ana Soto".to_owned(),
            email: "ana@aroma.cl".to_owned(),
            phone: "+56 9 8765 4321".to_owned(),
            address: "Prat 88".to_owned(),
            comuna: "Valparaíso".to_owned(),
            city: "Valparaíso".to_owned(),
        };
        let payload = OrderPayload::new(business, totals);
        let placed = DateTime::parse_from_rfc3339("2024-09-18T13:05:00Z")
            .unwrap()
            .with_timezone(&Utc);

        Order {
            id: OrderId::new(41),
            profile_id: ProfileId::new(3),
            total: payload.totals.total,
            payload,
            status,
            notes: None,
            created_at: placed,
            updated_at: placed,
        }
    }

    #[test]
    fn test_format_date() {
        let at = DateTime::parse_from_rfc3339("2024-09-18T13:05:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_date(at), "18-09-2024 13:05");
    }

    #[test]
    fn test_order_view_from_payload() {
        let view = OrderView::from(&order(OrderStatus::Pending));
        assert_eq!(view.number, "41");
        assert_eq!(view.placed_on, "18-09-2024 13:05");
        assert_eq!(view.total_units, 12);
        assert_eq!(view.tier, 2);
        assert_eq!(view.total, "$85.537");
        assert_eq!(view.delivery_address, "Prat 88, Valparaíso, Valparaíso");
        assert_eq!(
            view.next_statuses,
            vec![OrderStatus::Confirmed, OrderStatus::Cancelled]
        );

        let delivered = OrderView::from(&order(OrderStatus::Delivered));
        assert!(delivered.next_statuses.is_empty());
    }

    #[test]
    fn test_approval_tabs_mark_current() {
        let tabs = approval_tabs(Some(ApprovalStatus::Rejected), false);
        assert_eq!(tabs.len(), 3);
        assert!(tabs.iter().any(|t| t.value == "rejected" && t.active));
        assert_eq!(tabs.iter().filter(|t| t.active).count(), 1);

        let tabs = approval_tabs(None, true);
        assert_eq!(tabs.len(), 4);
        assert!(tabs[0].active);
    }

    #[test]
    fn test_order_tabs_include_all() {
        let tabs = order_tabs(None);
        assert_eq!(tabs.len(), 5);
        assert_eq!(tabs[0].label, "Todos");
        assert!(tabs[0].active);
    }

    #[test]
    fn test_socio_view_collects_contact_and_coordinates() {
        let socio = Socio {
            id: SocioId::new(5),
            name: "Almacén Doña Rosa".to_owned(),
            address: "Colón 1500".to_owned(),
            comuna: "Talcahuano".to_owned(),
            region: "Biobío".to_owned(),
            phone: Some("+56 41 255 0000".to_owned()),
            email: None,
            instagram: Some("@donarosa".to_owned()),
            location: Some(Coordinates::new(-36.724_31, -73.116_89).unwrap()),
            status: ApprovalStatus::Approved,
            is_public: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let view = SocioView::from(&socio);
        assert_eq!(view.contact, ["+56 41 255 0000", "@donarosa"]);
        assert_eq!(view.coordinates.as_deref(), Some("-36.72431, -73.11689"));
        assert!(view.is_listed);
    }

    #[test]
    fn test_viewer_cannot_write() {
        let admin = CurrentAdmin {
            id: AdminUserId::new(2),
            email: Email::parse("lectura@deliciasflorencia.cl").unwrap(),
            name: "Solo Lectura".to_owned(),
            role: AdminRole::Viewer,
        };
        let view = AdminUserView::from(&admin);
        assert!(!view.can_write);
        assert!(!view.is_super_admin);
    }
}
