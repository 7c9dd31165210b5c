//! Plain-text rendering for menus, order summaries and receipts.

use chrono::{DateTime, Local};

use crate::model::{Category, Menu};
use crate::order::{DiningOption, Order, PaymentMethod, TakeoutType};

/// `25000` -> `$25,000`
pub fn format_price(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("${}", grouped)
}

pub fn render_menu(menu: &Menu, shop_name: &str) -> String {
    let mut response = format!("☕ *{} Menu* ☕\n\n", shop_name);
    for category in Category::ALL {
        let items = menu.items(category);
        response.push_str(&format!("*{}* {}:\n", category.display_name(), category.emoji()));
        if items.is_empty() {
            response.push_str(&format!(
                "_No {} menu available yet._\n",
                category.display_name().to_lowercase()
            ));
        }
        for item in items {
            response.push_str(&format!("• {}: {}", item.name, format_price(item.price.into())));
            if !item.description.is_empty() {
                response.push_str(&format!("\n  _{}_", item.description));
            }
            response.push('\n');
        }
        response.push('\n');
    }
    response.push_str(&format!("*Ordering Information* ℹ️:\n{}", menu.order_info));
    response
}

/// Everything needed to print a receipt for a finalized order.
pub struct ReceiptDetails<'a> {
    pub shop_name: &'a str,
    pub order_id: &'a str,
    pub order: &'a Order,
    pub payment_method: PaymentMethod,
    pub issued_at: DateTime<Local>,
}

pub fn render_receipt(details: &ReceiptDetails<'_>) -> String {
    let order = details.order;
    let total = format_price(order.total_price());

    let item_lines: Vec<String> = order
        .lines()
        .iter()
        .map(|l| format!("{}x {}", l.quantity, l.item.name))
        .collect();
    let item_summary = if item_lines.is_empty() {
        "No items".to_string()
    } else {
        item_lines.join("\n- ")
    };

    let mut receipt = format!(
        "--- {} Order Receipt ---\n\
         Order Number: *{}*\n\
         Date: {}\n\n\
         Items Ordered:\n- {}\n\n\
         Total Price: *{}*\n\
         Payment Method: {}\n",
        details.shop_name,
        details.order_id,
        details.issued_at.format("%d-%m-%Y %H:%M"),
        item_summary,
        total,
        details.payment_method,
    );

    let preparation_time = match (order.dining_option, order.takeout_type) {
        (Some(DiningOption::DineIn), _) => {
            receipt.push_str("Dining Option: In-Place\n");
            "about 15 minutes"
        }
        (Some(DiningOption::Takeaway), Some(TakeoutType::Pickup)) => {
            receipt.push_str("Dining Option: Takeaway (Self-Pickup)\n");
            "about 20 minutes"
        }
        _ => "according to queue",
    };

    match details.payment_method {
        PaymentMethod::EWallet => {
            receipt.push_str("\nPayment Status: *PAID (Simulation)*\n");
            format!(
                "Payment via {} (simulation) of {} successful! 👍\n\n{}\n\
                 Your order will be ready in {}. Thank you for ordering!",
                details.payment_method, total, receipt, preparation_time
            )
        }
        PaymentMethod::Cash => {
            receipt.push_str("\nPayment Status: *UNPAID*\n");
            format!(
                "Alright, please make a payment of {} at the counter by showing Order Number *{}*.\n\n{}\n\
                 The order will be prepared after payment and will be ready in {}. Thank you!",
                total, details.order_id, receipt, preparation_time
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MenuItem;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(0), "$0");
        assert_eq!(format_price(999), "$999");
        assert_eq!(format_price(1_000), "$1,000");
        assert_eq!(format_price(25_000), "$25,000");
        assert_eq!(format_price(1_234_567), "$1,234,567");
    }

    #[test]
    fn test_menu_lists_empty_categories() {
        let mut menu = Menu::with_order_info("Pay at the counter.");
        menu.pastry.push(
            MenuItem::new("P_1", "Croissant", 15_000, "Buttery", Category::Pastry).unwrap(),
        );
        let text = render_menu(&menu, "Mata Kopian");
        assert!(text.starts_with("☕ *Mata Kopian Menu*"));
        assert!(text.contains("• Croissant: $15,000\n  _Buttery_"));
        assert!(text.contains("_No iced coffee menu available yet._"));
        assert!(text.ends_with("Pay at the counter."));
    }

    #[test]
    fn test_cash_receipt_for_pickup() {
        let mut order = Order::new();
        order.add_line(
            MenuItem::new("I_1", "Iced Coffee", 18_000, "", Category::IcedCoffee).unwrap(),
            2,
        );
        order.dining_option = Some(DiningOption::Takeaway);
        order.takeout_type = Some(TakeoutType::Pickup);

        let text = render_receipt(&ReceiptDetails {
            shop_name: "Mata Kopian",
            order_id: "KC261019-1234ABCD",
            order: &order,
            payment_method: PaymentMethod::Cash,
            issued_at: Local::now(),
        });
        assert!(text.contains("--- Mata Kopian Order Receipt ---"));
        assert!(text.contains("- 2x Iced Coffee"));
        assert!(text.contains("Total Price: *$36,000*"));
        assert!(text.contains("Dining Option: Takeaway (Self-Pickup)"));
        assert!(text.contains("*UNPAID*"));
        assert!(text.contains("about 20 minutes"));
    }

    #[test]
    fn test_ewallet_receipt_for_dine_in() {
        let mut order = Order::new();
        order.add_line(
            MenuItem::new("E_1", "Latte", 22_000, "", Category::EspressoBased).unwrap(),
            1,
        );
        order.dining_option = Some(DiningOption::DineIn);

        let text = render_receipt(&ReceiptDetails {
            shop_name: "Mata Kopian",
            order_id: "KC261019-1234ABCD",
            order: &order,
            payment_method: PaymentMethod::EWallet,
            issued_at: Local::now(),
        });
        assert!(text.starts_with("Payment via E-Wallet (simulation) of $22,000 successful!"));
        assert!(text.contains("Dining Option: In-Place"));
        assert!(text.contains("PAID (Simulation)"));
        assert!(text.contains("about 15 minutes"));
    }
}
