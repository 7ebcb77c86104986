use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn format_date(d: &NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

fn date_from_sql(idx: usize, s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn pass_type_from_sql(idx: usize, s: &str) -> rusqlite::Result<PassType> {
    s.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn status_from_sql(idx: usize, s: &str) -> rusqlite::Result<CancellationStatus> {
    s.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Allocation counter column for a pass type. Static strings only; these are
/// spliced into SQL.
fn allocation_column(pass: PassType) -> &'static str {
    match pass {
        PassType::Express => "express_pass",
        PassType::Junior => "junior_pass",
        PassType::Regular => "regular_pass",
        PassType::Student => "student_pass",
        PassType::SeniorCitizen => "senior_citizen_pass",
        PassType::Pwd => "pwd_pass",
    }
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

const EMPLOYEE_COLUMNS: &str = "id, name, username, express_pass, junior_pass, regular_pass, \
     student_pass, senior_citizen_pass, pwd_pass, created_at";

fn employee_from_row(row: &Row<'_>) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: row.get(0)?,
        name: row.get(1)?,
        username: row.get(2)?,
        allocations: PassAllocations {
            express: row.get(3)?,
            junior: row.get(4)?,
            regular: row.get(5)?,
            student: row.get(6)?,
            senior_citizen: row.get(7)?,
            pwd: row.get(8)?,
        },
        created_at: parse_datetime(&row.get::<_, String>(9)?),
    })
}

const TOKEN_COLUMNS: &str =
    "id, token_hash, token_lookup, is_admin, employee_id, created_at, expires_at, last_used_at";

fn token_from_row(row: &Row<'_>) -> rusqlite::Result<Token> {
    Ok(Token {
        id: row.get(0)?,
        token_hash: row.get(1)?,
        token_lookup: row.get(2)?,
        is_admin: row.get(3)?,
        employee_id: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        expires_at: row.get::<_, Option<String>>(6)?.map(|s| parse_datetime(&s)),
        last_used_at: row.get::<_, Option<String>>(7)?.map(|s| parse_datetime(&s)),
    })
}

const SALE_COLUMNS: &str = "ticket_id, name, email, quantity, amount, booked_date, \
     purchased_date, pass_type, employee_id";

fn sale_from_row(row: &Row<'_>) -> rusqlite::Result<Sale> {
    Ok(Sale {
        ticket_id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        quantity: row.get(3)?,
        amount: row.get(4)?,
        booked_date: date_from_sql(5, &row.get::<_, String>(5)?)?,
        purchased_date: date_from_sql(6, &row.get::<_, String>(6)?)?,
        pass_type: pass_type_from_sql(7, &row.get::<_, String>(7)?)?,
        employee_id: row.get(8)?,
    })
}

const CANCELLATION_COLUMNS: &str = "id, ticket_id, name, email, reasons, quantity, amount, \
     booked_date, purchased_date, pass_type, status";

fn cancellation_from_row(row: &Row<'_>) -> rusqlite::Result<Cancellation> {
    Ok(Cancellation {
        id: row.get(0)?,
        ticket_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        reasons: row.get(4)?,
        quantity: row.get(5)?,
        amount: row.get(6)?,
        booked_date: date_from_sql(7, &row.get::<_, String>(7)?)?,
        purchased_date: date_from_sql(8, &row.get::<_, String>(8)?)?,
        pass_type: pass_type_from_sql(9, &row.get::<_, String>(9)?)?,
        status: status_from_sql(10, &row.get::<_, String>(10)?)?,
    })
}

fn amounts_match(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA)?;

        // Seed default prices on first run only
        for pass in PassType::ALL {
            conn.execute(
                "INSERT OR IGNORE INTO pricing (pass_type, price) VALUES (?1, ?2)",
                params![pass.as_str(), pass.default_price()],
            )?;
        }
        Ok(())
    }

    // Employee operations

    fn create_employee(&self, employee: &Employee) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO employees (id, name, username, express_pass, junior_pass, regular_pass,
                                    student_pass, senior_citizen_pass, pwd_pass, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                employee.id,
                employee.name,
                employee.username,
                employee.allocations.express,
                employee.allocations.junior,
                employee.allocations.regular,
                employee.allocations.student,
                employee.allocations.senior_citizen,
                employee.allocations.pwd,
                format_datetime(&employee.created_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_employee(&self, id: &str) -> Result<Option<Employee>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?1"),
            params![id],
            employee_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_employee_by_username(&self, username: &str) -> Result<Option<Employee>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE username = ?1"),
            params![username],
            employee_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_employees(&self, cursor: &str, limit: i32) -> Result<Vec<Employee>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id > ?1 ORDER BY id LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![cursor, limit], employee_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_employee(&self, employee: &Employee) -> Result<()> {
        let result = self.conn().execute(
            "UPDATE employees SET name = ?1, username = ?2, express_pass = ?3, junior_pass = ?4,
                                  regular_pass = ?5, student_pass = ?6, senior_citizen_pass = ?7,
                                  pwd_pass = ?8
             WHERE id = ?9",
            params![
                employee.name,
                employee.username,
                employee.allocations.express,
                employee.allocations.junior,
                employee.allocations.regular,
                employee.allocations.student,
                employee.allocations.senior_citizen,
                employee.allocations.pwd,
                employee.id,
            ],
        );

        match result {
            Ok(0) => Err(Error::NotFound),
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn delete_employee(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM employees WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Token operations

    fn create_token(&self, token: &Token) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO tokens (id, token_hash, token_lookup, is_admin, employee_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                token.id,
                token.token_hash,
                token.token_lookup,
                token.is_admin,
                token.employee_id,
                format_datetime(&token.created_at),
                token.expires_at.as_ref().map(format_datetime),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::TokenLookupCollision),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_token_by_id(&self, id: &str) -> Result<Option<Token>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE id = ?1"),
            params![id],
            token_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE token_lookup = ?1"),
            params![lookup],
            token_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_tokens(&self, cursor: &str, limit: i32) -> Result<Vec<Token>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens WHERE id > ?1 ORDER BY id LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![cursor, limit], token_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_employee_tokens(&self, employee_id: &str) -> Result<Vec<Token>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens WHERE employee_id = ?1 ORDER BY created_at DESC"
        ))?;

        let rows = stmt.query_map(params![employee_id], token_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_token(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM tokens WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn update_token_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE tokens SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    fn has_admin_token(&self) -> Result<bool> {
        let conn = self.conn();
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM tokens WHERE is_admin = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Sales ledger

    fn create_sale(&self, sale: &Sale) -> Result<()> {
        let employee_id = sale
            .employee_id
            .as_deref()
            .ok_or_else(|| Error::BadRequest("sale requires a selling employee".to_string()))?;

        let mut conn = self.conn();
        let tx = conn.transaction()?;

        // Availability is re-derived inside the transaction so the gate and
        // the insert are atomic; two concurrent sales cannot oversell.
        let column = allocation_column(sale.pass_type);
        let allocation: i64 = tx
            .query_row(
                &format!("SELECT {column} FROM employees WHERE id = ?1"),
                params![employee_id],
                |row| row.get(0),
            )
            .optional()?
            // No allocation row: fails closed, the employee cannot sell this type
            .unwrap_or(0);

        let sold: i64 = tx.query_row(
            "SELECT COALESCE(SUM(quantity), 0) FROM sales
             WHERE pass_type = ?1 AND employee_id = ?2",
            params![sale.pass_type.as_str(), employee_id],
            |row| row.get(0),
        )?;

        let park_wide_sold: i64 = tx.query_row(
            "SELECT COALESCE(SUM(quantity), 0) FROM sales WHERE pass_type = ?1",
            params![sale.pass_type.as_str()],
            |row| row.get(0),
        )?;

        let available = (allocation - sold).min(PARK_WIDE_CAP - park_wide_sold);

        if sale.quantity > available {
            return Err(Error::InsufficientAvailability {
                pass_type: sale.pass_type,
                available: available.max(0),
            });
        }

        let result = tx.execute(
            "INSERT INTO sales (ticket_id, name, email, quantity, amount, booked_date,
                                purchased_date, pass_type, employee_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                sale.ticket_id,
                sale.name,
                sale.email,
                sale.quantity,
                sale.amount,
                format_date(&sale.booked_date),
                format_date(&sale.purchased_date),
                sale.pass_type.as_str(),
                employee_id,
            ],
        );

        match result {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => return Err(Error::TicketIdCollision),
            Err(e) => return Err(Error::from(e)),
        }

        tx.commit()?;
        Ok(())
    }

    fn get_sale(&self, ticket_id: &str) -> Result<Option<Sale>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {SALE_COLUMNS} FROM sales WHERE ticket_id = ?1"),
            params![ticket_id],
            sale_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_sales(
        &self,
        employee_id: Option<&str>,
        cursor: &str,
        limit: i32,
    ) -> Result<Vec<Sale>> {
        let conn = self.conn();

        let rows = match employee_id {
            Some(employee_id) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {SALE_COLUMNS} FROM sales
                     WHERE employee_id = ?1 AND ticket_id > ?2 ORDER BY ticket_id LIMIT ?3"
                ))?;
                let rows = stmt.query_map(params![employee_id, cursor, limit], sale_from_row)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {SALE_COLUMNS} FROM sales
                     WHERE ticket_id > ?1 ORDER BY ticket_id LIMIT ?2"
                ))?;
                let rows = stmt.query_map(params![cursor, limit], sale_from_row)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()
            }
        };

        rows.map_err(Error::from)
    }

    fn update_sale(&self, sale: &Sale) -> Result<()> {
        // ticket_id and employee_id are immutable
        let rows = self.conn().execute(
            "UPDATE sales SET name = ?1, email = ?2, quantity = ?3, amount = ?4,
                              booked_date = ?5, pass_type = ?6
             WHERE ticket_id = ?7",
            params![
                sale.name,
                sale.email,
                sale.quantity,
                sale.amount,
                format_date(&sale.booked_date),
                sale.pass_type.as_str(),
                sale.ticket_id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_sale(&self, ticket_id: &str, employee_id: Option<&str>) -> Result<bool> {
        let conn = self.conn();
        let rows = match employee_id {
            Some(employee_id) => conn.execute(
                "DELETE FROM sales WHERE ticket_id = ?1 AND employee_id = ?2",
                params![ticket_id, employee_id],
            )?,
            None => conn.execute("DELETE FROM sales WHERE ticket_id = ?1", params![ticket_id])?,
        };
        Ok(rows > 0)
    }

    // Availability accounting

    fn allocation_for(&self, employee_id: &str, pass: PassType) -> Result<i64> {
        let conn = self.conn();
        let column = allocation_column(pass);
        let allocation: Option<i64> = conn
            .query_row(
                &format!("SELECT {column} FROM employees WHERE id = ?1"),
                params![employee_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(allocation.unwrap_or(0))
    }

    fn sold_by_employee(&self, employee_id: &str, pass: PassType) -> Result<i64> {
        let conn = self.conn();
        let sold: i64 = conn.query_row(
            "SELECT COALESCE(SUM(quantity), 0) FROM sales
             WHERE pass_type = ?1 AND employee_id = ?2",
            params![pass.as_str(), employee_id],
            |row| row.get(0),
        )?;
        Ok(sold)
    }

    fn sold_park_wide(&self, pass: PassType) -> Result<i64> {
        let conn = self.conn();
        let sold: i64 = conn.query_row(
            "SELECT COALESCE(SUM(quantity), 0) FROM sales WHERE pass_type = ?1",
            params![pass.as_str()],
            |row| row.get(0),
        )?;
        Ok(sold)
    }

    fn availability_for(&self, employee_id: &str, pass: PassType) -> Result<Availability> {
        let allocation = self.allocation_for(employee_id, pass)?;
        let sold = self.sold_by_employee(employee_id, pass)?;
        let park_wide_remaining = PARK_WIDE_CAP - self.sold_park_wide(pass)?;
        let available = (allocation - sold).min(park_wide_remaining).max(0);

        Ok(Availability {
            pass_type: pass,
            allocation,
            sold,
            park_wide_remaining,
            available,
        })
    }

    // Cancellation workflow

    fn create_cancellation(&self, request: &CancellationRequest) -> Result<Cancellation> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let sale = tx
            .query_row(
                &format!("SELECT {SALE_COLUMNS} FROM sales WHERE ticket_id = ?1"),
                params![request.ticket_id],
                sale_from_row,
            )
            .optional()?
            .ok_or(Error::TicketNotFound)?;

        let duplicate: Option<i64> = tx
            .query_row(
                "SELECT id FROM cancellations WHERE ticket_id = ?1",
                params![request.ticket_id],
                |row| row.get(0),
            )
            .optional()?;
        if duplicate.is_some() {
            return Err(Error::DuplicateCancellation);
        }

        if request.name != sale.name {
            return Err(Error::CancellationMismatch("name".to_string()));
        }
        if request.email != sale.email {
            return Err(Error::CancellationMismatch("email".to_string()));
        }
        if request.quantity != sale.quantity {
            return Err(Error::CancellationMismatch("quantity".to_string()));
        }
        if !amounts_match(request.amount, sale.amount) {
            return Err(Error::CancellationMismatch("amount".to_string()));
        }
        if request.pass_type != sale.pass_type {
            return Err(Error::CancellationMismatch("pass type".to_string()));
        }

        tx.execute(
            "INSERT INTO cancellations (ticket_id, name, email, reasons, quantity, amount,
                                        booked_date, purchased_date, pass_type, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                request.ticket_id,
                request.name,
                request.email,
                request.reasons,
                request.quantity,
                request.amount,
                format_date(&sale.booked_date),
                format_date(&sale.purchased_date),
                request.pass_type.as_str(),
                CancellationStatus::Pending.as_str(),
            ],
        )?;

        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Cancellation {
            id,
            ticket_id: request.ticket_id.clone(),
            name: request.name.clone(),
            email: request.email.clone(),
            reasons: request.reasons.clone(),
            quantity: request.quantity,
            amount: request.amount,
            booked_date: sale.booked_date,
            purchased_date: sale.purchased_date,
            pass_type: request.pass_type,
            status: CancellationStatus::Pending,
        })
    }

    fn get_cancellation(&self, ticket_id: &str) -> Result<Option<Cancellation>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {CANCELLATION_COLUMNS} FROM cancellations WHERE ticket_id = ?1"),
            params![ticket_id],
            cancellation_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_cancellations(&self, cursor: &str, limit: i32) -> Result<Vec<Cancellation>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CANCELLATION_COLUMNS} FROM cancellations
             WHERE ticket_id > ?1 ORDER BY ticket_id LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![cursor, limit], cancellation_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn set_cancellation_status(
        &self,
        ticket_id: &str,
        status: CancellationStatus,
    ) -> Result<Cancellation> {
        if !status.is_terminal() {
            // Nothing transitions back to Pending
            return Err(Error::BadRequest(
                "status can only be set to Approved or Rejected".to_string(),
            ));
        }

        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let mut cancellation = tx
            .query_row(
                &format!("SELECT {CANCELLATION_COLUMNS} FROM cancellations WHERE ticket_id = ?1"),
                params![ticket_id],
                cancellation_from_row,
            )
            .optional()?
            .ok_or(Error::NotFound)?;

        if cancellation.status.is_terminal() {
            return Err(Error::CancellationResolved);
        }

        tx.execute(
            "UPDATE cancellations SET status = ?1 WHERE ticket_id = ?2",
            params![status.as_str(), ticket_id],
        )?;
        tx.commit()?;

        cancellation.status = status;
        Ok(cancellation)
    }

    fn delete_cancellation(&self, ticket_id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM cancellations WHERE ticket_id = ?1",
            params![ticket_id],
        )?;
        Ok(rows > 0)
    }

    // Pricing table

    fn list_prices(&self) -> Result<Vec<PassPrice>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT pass_type, price FROM pricing ORDER BY pass_type")?;

        let rows = stmt.query_map([], |row| {
            Ok(PassPrice {
                pass_type: pass_type_from_sql(0, &row.get::<_, String>(0)?)?,
                price: row.get(1)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn get_price(&self, pass: PassType) -> Result<f64> {
        let conn = self.conn();
        conn.query_row(
            "SELECT price FROM pricing WHERE pass_type = ?1",
            params![pass.as_str()],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(Error::NotFound)
    }

    fn update_prices(&self, prices: &[(PassType, f64)]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        for (pass, price) in prices {
            let rows = tx.execute(
                "UPDATE pricing SET price = ?1 WHERE pass_type = ?2",
                params![price, pass.as_str()],
            )?;
            if rows == 0 {
                return Err(Error::NotFound);
            }
        }

        tx.commit()?;
        Ok(())
    }

    // Report aggregates

    fn sales_summary(
        &self,
        employee_id: Option<&str>,
        month: Option<&str>,
    ) -> Result<SalesSummary> {
        let conn = self.conn();

        let mut sales_sql = String::from(
            "SELECT COALESCE(SUM(amount), 0), COALESCE(SUM(quantity), 0) FROM sales WHERE 1=1",
        );
        let mut sales_params: Vec<&dyn rusqlite::types::ToSql> = Vec::new();
        if let Some(employee_id) = &employee_id {
            sales_sql.push_str(" AND employee_id = ?");
            sales_params.push(employee_id);
        }
        if let Some(month) = &month {
            sales_sql.push_str(" AND strftime('%Y-%m', purchased_date) = ?");
            sales_params.push(month);
        }

        let (gross_amount, gross_tickets): (f64, i64) =
            conn.query_row(&sales_sql, params_from_iter(sales_params), |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?;

        let mut refund_sql = String::from(
            "SELECT COALESCE(SUM(amount), 0), COALESCE(SUM(quantity), 0) FROM cancellations
             WHERE status = 'Approved'",
        );
        let mut pending_sql = String::from(
            "SELECT COUNT(*) FROM cancellations WHERE status = 'Pending'",
        );
        let mut cancel_params: Vec<&dyn rusqlite::types::ToSql> = Vec::new();
        if let Some(employee_id) = &employee_id {
            let scope = " AND ticket_id IN (SELECT ticket_id FROM sales WHERE employee_id = ?)";
            refund_sql.push_str(scope);
            pending_sql.push_str(scope);
            cancel_params.push(employee_id);
        }
        if let Some(month) = &month {
            refund_sql.push_str(" AND strftime('%Y-%m', purchased_date) = ?");
            cancel_params.push(month);
        }

        let (refunded_amount, refunded_tickets): (f64, i64) =
            conn.query_row(&refund_sql, params_from_iter(cancel_params.iter()), |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?;

        // The month filter does not apply to the pending count
        let pending_params: Vec<&dyn rusqlite::types::ToSql> = match &employee_id {
            Some(employee_id) => vec![employee_id],
            None => Vec::new(),
        };
        let pending_cancellations: i64 =
            conn.query_row(&pending_sql, params_from_iter(pending_params), |row| {
                row.get(0)
            })?;

        Ok(SalesSummary {
            gross_amount,
            refunded_amount,
            net_amount: gross_amount - refunded_amount,
            gross_tickets,
            refunded_tickets,
            net_tickets: gross_tickets - refunded_tickets,
            pending_cancellations,
        })
    }

    fn pass_type_breakdown(&self, employee_id: Option<&str>) -> Result<Vec<PassTypeSales>> {
        let conn = self.conn();

        let map_row = |row: &Row<'_>| -> rusqlite::Result<PassTypeSales> {
            Ok(PassTypeSales {
                pass_type: pass_type_from_sql(0, &row.get::<_, String>(0)?)?,
                tickets_sold: row.get(1)?,
            })
        };

        let rows = match employee_id {
            Some(employee_id) => {
                let mut stmt = conn.prepare(
                    "SELECT pass_type, SUM(quantity) AS total_qty FROM sales
                     WHERE employee_id = ?1 GROUP BY pass_type ORDER BY total_qty DESC",
                )?;
                let rows = stmt.query_map(params![employee_id], map_row)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT pass_type, SUM(quantity) AS total_qty FROM sales
                     GROUP BY pass_type ORDER BY total_qty DESC",
                )?;
                let rows = stmt.query_map([], map_row)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()
            }
        };

        rows.map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (temp, store)
    }

    fn test_employee(id: &str, username: &str, allocations: PassAllocations) -> Employee {
        Employee {
            id: id.to_string(),
            name: "Test Employee".to_string(),
            username: username.to_string(),
            allocations,
            created_at: Utc::now(),
        }
    }

    fn test_sale(ticket_id: &str, employee_id: &str, pass: PassType, quantity: i64) -> Sale {
        let price = pass.default_price();
        Sale {
            ticket_id: ticket_id.to_string(),
            name: "Alice Cruz".to_string(),
            email: "alice@example.com".to_string(),
            quantity,
            amount: price * quantity as f64,
            booked_date: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
            purchased_date: Utc::now().date_naive(),
            pass_type: pass,
            employee_id: Some(employee_id.to_string()),
        }
    }

    #[test]
    fn test_initialize_creates_tables_and_seeds_prices() {
        let (_temp, store) = test_store();

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"employees".to_string()));
        assert!(tables.contains(&"tokens".to_string()));
        assert!(tables.contains(&"sales".to_string()));
        assert!(tables.contains(&"cancellations".to_string()));
        assert!(tables.contains(&"pricing".to_string()));
        drop(conn);

        assert_eq!(store.get_price(PassType::Express).unwrap(), 2300.00);
        assert_eq!(store.get_price(PassType::Regular).unwrap(), 1300.00);
        assert_eq!(store.get_price(PassType::Pwd).unwrap(), 900.00);
        assert_eq!(store.list_prices().unwrap().len(), 6);
    }

    #[test]
    fn test_initialize_does_not_reseed_prices() {
        let (_temp, store) = test_store();

        store
            .update_prices(&[(PassType::Junior, 1000.00)])
            .unwrap();
        store.initialize().unwrap();

        assert_eq!(store.get_price(PassType::Junior).unwrap(), 1000.00);
    }

    #[test]
    fn test_employee_crud() {
        let (_temp, store) = test_store();

        let mut employee = test_employee(
            "E10001",
            "jdoe",
            PassAllocations {
                regular: 10,
                ..Default::default()
            },
        );
        store.create_employee(&employee).unwrap();

        let fetched = store.get_employee("E10001").unwrap().unwrap();
        assert_eq!(fetched.username, "jdoe");
        assert_eq!(fetched.allocations.get(PassType::Regular), 10);

        let by_username = store.get_employee_by_username("jdoe").unwrap().unwrap();
        assert_eq!(by_username.id, "E10001");

        employee.allocations.set(PassType::Express, 5);
        store.update_employee(&employee).unwrap();
        let fetched = store.get_employee("E10001").unwrap().unwrap();
        assert_eq!(fetched.allocations.get(PassType::Express), 5);

        assert!(store.delete_employee("E10001").unwrap());
        assert!(store.get_employee("E10001").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let (_temp, store) = test_store();

        store
            .create_employee(&test_employee("E10001", "jdoe", PassAllocations::default()))
            .unwrap();
        let result =
            store.create_employee(&test_employee("E10002", "jdoe", PassAllocations::default()));
        assert!(matches!(result, Err(Error::AlreadyExists)));
    }

    #[test]
    fn test_sale_within_allocation_accepted() {
        let (_temp, store) = test_store();

        store
            .create_employee(&test_employee(
                "E10001",
                "jdoe",
                PassAllocations {
                    regular: 10,
                    ..Default::default()
                },
            ))
            .unwrap();

        // allocation 10, price 1300.00, quantity 4 => amount 5200.00
        store
            .create_sale(&test_sale("FAB123", "E10001", PassType::Regular, 4))
            .unwrap();

        let sale = store.get_sale("FAB123").unwrap().unwrap();
        assert_eq!(sale.amount, 5200.00);
        assert_eq!(sale.quantity, 4);

        let availability = store
            .availability_for("E10001", PassType::Regular)
            .unwrap();
        assert_eq!(availability.allocation, 10);
        assert_eq!(availability.sold, 4);
        assert_eq!(availability.available, 6);
    }

    #[test]
    fn test_oversell_rejected_without_insert() {
        let (_temp, store) = test_store();

        store
            .create_employee(&test_employee(
                "E10001",
                "jdoe",
                PassAllocations {
                    regular: 10,
                    ..Default::default()
                },
            ))
            .unwrap();
        store
            .create_sale(&test_sale("FAB123", "E10001", PassType::Regular, 4))
            .unwrap();

        // 6 available, 7 requested
        let result = store.create_sale(&test_sale("FAB124", "E10001", PassType::Regular, 7));
        match result {
            Err(Error::InsufficientAvailability {
                pass_type,
                available,
            }) => {
                assert_eq!(pass_type, PassType::Regular);
                assert_eq!(available, 6);
            }
            other => panic!("expected InsufficientAvailability, got {other:?}"),
        }

        assert!(store.get_sale("FAB124").unwrap().is_none());
        let availability = store
            .availability_for("E10001", PassType::Regular)
            .unwrap();
        assert_eq!(availability.available, 6);
    }

    #[test]
    fn test_missing_allocation_fails_closed() {
        let (_temp, store) = test_store();

        store
            .create_employee(&test_employee("E10001", "jdoe", PassAllocations::default()))
            .unwrap();

        let result = store.create_sale(&test_sale("FAB123", "E10001", PassType::Express, 1));
        assert!(matches!(
            result,
            Err(Error::InsufficientAvailability { available: 0, .. })
        ));
    }

    #[test]
    fn test_park_wide_cap_bounds_availability() {
        let (_temp, store) = test_store();

        // Allocation far above the park-wide cap
        store
            .create_employee(&test_employee(
                "E10001",
                "jdoe",
                PassAllocations {
                    junior: 5000,
                    ..Default::default()
                },
            ))
            .unwrap();
        store
            .create_sale(&test_sale("FAB123", "E10001", PassType::Junior, 998))
            .unwrap();

        let availability = store.availability_for("E10001", PassType::Junior).unwrap();
        assert_eq!(availability.park_wide_remaining, 2);
        assert_eq!(availability.available, 2);

        let result = store.create_sale(&test_sale("FAB124", "E10001", PassType::Junior, 3));
        assert!(matches!(
            result,
            Err(Error::InsufficientAvailability { available: 2, .. })
        ));

        store
            .create_sale(&test_sale("FAB125", "E10001", PassType::Junior, 2))
            .unwrap();
    }

    #[test]
    fn test_park_wide_sales_count_across_employees() {
        let (_temp, store) = test_store();

        for (id, username) in [("E10001", "jdoe"), ("E10002", "msantos")] {
            store
                .create_employee(&test_employee(
                    id,
                    username,
                    PassAllocations {
                        student: 600,
                        ..Default::default()
                    },
                ))
                .unwrap();
        }

        store
            .create_sale(&test_sale("FAB123", "E10001", PassType::Student, 600))
            .unwrap();

        // Second employee has a full allocation but the park only has 400 left
        let availability = store
            .availability_for("E10002", PassType::Student)
            .unwrap();
        assert_eq!(availability.allocation, 600);
        assert_eq!(availability.sold, 0);
        assert_eq!(availability.available, 400);
    }

    #[test]
    fn test_ticket_id_collision_reported() {
        let (_temp, store) = test_store();

        store
            .create_employee(&test_employee(
                "E10001",
                "jdoe",
                PassAllocations {
                    regular: 10,
                    ..Default::default()
                },
            ))
            .unwrap();
        store
            .create_sale(&test_sale("FAB123", "E10001", PassType::Regular, 1))
            .unwrap();

        let result = store.create_sale(&test_sale("FAB123", "E10001", PassType::Regular, 1));
        assert!(matches!(result, Err(Error::TicketIdCollision)));
    }

    #[test]
    fn test_approved_cancellation_does_not_restore_availability() {
        // Sale-time availability deliberately ignores cancellations; only the
        // report aggregates net them out.
        let (_temp, store) = test_store();

        store
            .create_employee(&test_employee(
                "E10001",
                "jdoe",
                PassAllocations {
                    regular: 10,
                    ..Default::default()
                },
            ))
            .unwrap();
        let sale = test_sale("FAB123", "E10001", PassType::Regular, 4);
        store.create_sale(&sale).unwrap();

        store
            .create_cancellation(&CancellationRequest {
                ticket_id: "FAB123".to_string(),
                name: sale.name.clone(),
                email: sale.email.clone(),
                reasons: "change of plans".to_string(),
                quantity: sale.quantity,
                amount: sale.amount,
                pass_type: sale.pass_type,
            })
            .unwrap();
        store
            .set_cancellation_status("FAB123", CancellationStatus::Approved)
            .unwrap();

        let availability = store
            .availability_for("E10001", PassType::Regular)
            .unwrap();
        assert_eq!(availability.available, 6);

        let summary = store.sales_summary(Some("E10001"), None).unwrap();
        assert_eq!(summary.gross_tickets, 4);
        assert_eq!(summary.refunded_tickets, 4);
        assert_eq!(summary.net_tickets, 0);
        assert_eq!(summary.net_amount, 0.0);
    }

    #[test]
    fn test_cancellation_requires_existing_ticket() {
        let (_temp, store) = test_store();

        let result = store.create_cancellation(&CancellationRequest {
            ticket_id: "FZZZZZ".to_string(),
            name: "Alice Cruz".to_string(),
            email: "alice@example.com".to_string(),
            reasons: "no show".to_string(),
            quantity: 1,
            amount: 1300.00,
            pass_type: PassType::Regular,
        });
        assert!(matches!(result, Err(Error::TicketNotFound)));
        assert!(store.list_cancellations("", 10).unwrap().is_empty());
    }

    #[test]
    fn test_cancellation_detail_mismatch_rejected() {
        let (_temp, store) = test_store();

        store
            .create_employee(&test_employee(
                "E10001",
                "jdoe",
                PassAllocations {
                    regular: 10,
                    ..Default::default()
                },
            ))
            .unwrap();
        let sale = test_sale("FAB123", "E10001", PassType::Regular, 4);
        store.create_sale(&sale).unwrap();

        // Quantity differs from the sale
        let result = store.create_cancellation(&CancellationRequest {
            ticket_id: "FAB123".to_string(),
            name: sale.name.clone(),
            email: sale.email.clone(),
            reasons: "partial refund".to_string(),
            quantity: 2,
            amount: sale.amount,
            pass_type: sale.pass_type,
        });
        assert!(matches!(result, Err(Error::CancellationMismatch(_))));
        assert!(store.get_cancellation("FAB123").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_cancellation_rejected() {
        let (_temp, store) = test_store();

        store
            .create_employee(&test_employee(
                "E10001",
                "jdoe",
                PassAllocations {
                    regular: 10,
                    ..Default::default()
                },
            ))
            .unwrap();
        let sale = test_sale("FAB123", "E10001", PassType::Regular, 4);
        store.create_sale(&sale).unwrap();

        let request = CancellationRequest {
            ticket_id: "FAB123".to_string(),
            name: sale.name.clone(),
            email: sale.email.clone(),
            reasons: "change of plans".to_string(),
            quantity: sale.quantity,
            amount: sale.amount,
            pass_type: sale.pass_type,
        };
        let created = store.create_cancellation(&request).unwrap();
        assert_eq!(created.status, CancellationStatus::Pending);
        assert_eq!(created.booked_date, sale.booked_date);

        let result = store.create_cancellation(&request);
        assert!(matches!(result, Err(Error::DuplicateCancellation)));
        assert_eq!(store.list_cancellations("", 10).unwrap().len(), 1);
    }

    #[test]
    fn test_cancellation_status_is_monotonic() {
        let (_temp, store) = test_store();

        store
            .create_employee(&test_employee(
                "E10001",
                "jdoe",
                PassAllocations {
                    regular: 10,
                    ..Default::default()
                },
            ))
            .unwrap();
        let sale = test_sale("FAB123", "E10001", PassType::Regular, 4);
        store.create_sale(&sale).unwrap();
        store
            .create_cancellation(&CancellationRequest {
                ticket_id: "FAB123".to_string(),
                name: sale.name.clone(),
                email: sale.email.clone(),
                reasons: "change of plans".to_string(),
                quantity: sale.quantity,
                amount: sale.amount,
                pass_type: sale.pass_type,
            })
            .unwrap();

        let updated = store
            .set_cancellation_status("FAB123", CancellationStatus::Rejected)
            .unwrap();
        assert_eq!(updated.status, CancellationStatus::Rejected);

        // Terminal: no second transition, no return to Pending
        let result = store.set_cancellation_status("FAB123", CancellationStatus::Approved);
        assert!(matches!(result, Err(Error::CancellationResolved)));
        let result = store.set_cancellation_status("FAB123", CancellationStatus::Pending);
        assert!(matches!(result, Err(Error::BadRequest(_))));

        let stored = store.get_cancellation("FAB123").unwrap().unwrap();
        assert_eq!(stored.status, CancellationStatus::Rejected);
    }

    #[test]
    fn test_price_update_is_transactional() {
        let (_temp, store) = test_store();

        let prices: Vec<(PassType, f64)> = PassType::ALL
            .iter()
            .map(|pass| (*pass, pass.default_price() + 100.0))
            .collect();
        store.update_prices(&prices).unwrap();
        assert_eq!(store.get_price(PassType::Express).unwrap(), 2400.00);

        // A row deleted out from under the update makes the batch roll back
        store
            .conn()
            .execute("DELETE FROM pricing WHERE pass_type = 'PWD Pass'", [])
            .unwrap();
        let result = store.update_prices(
            &PassType::ALL
                .iter()
                .map(|pass| (*pass, 1.0))
                .collect::<Vec<_>>(),
        );
        assert!(matches!(result, Err(Error::NotFound)));
        assert_eq!(store.get_price(PassType::Express).unwrap(), 2400.00);
    }

    #[test]
    fn test_deleting_employee_orphans_sales() {
        let (_temp, store) = test_store();

        store
            .create_employee(&test_employee(
                "E10001",
                "jdoe",
                PassAllocations {
                    regular: 10,
                    ..Default::default()
                },
            ))
            .unwrap();
        store
            .create_sale(&test_sale("FAB123", "E10001", PassType::Regular, 2))
            .unwrap();

        assert!(store.delete_employee("E10001").unwrap());

        let sale = store.get_sale("FAB123").unwrap().unwrap();
        assert!(sale.employee_id.is_none());
    }

    #[test]
    fn test_deleting_sale_cascades_cancellation() {
        let (_temp, store) = test_store();

        store
            .create_employee(&test_employee(
                "E10001",
                "jdoe",
                PassAllocations {
                    regular: 10,
                    ..Default::default()
                },
            ))
            .unwrap();
        let sale = test_sale("FAB123", "E10001", PassType::Regular, 2);
        store.create_sale(&sale).unwrap();
        store
            .create_cancellation(&CancellationRequest {
                ticket_id: "FAB123".to_string(),
                name: sale.name.clone(),
                email: sale.email.clone(),
                reasons: "weather".to_string(),
                quantity: sale.quantity,
                amount: sale.amount,
                pass_type: sale.pass_type,
            })
            .unwrap();

        assert!(store.delete_sale("FAB123", None).unwrap());
        assert!(store.get_cancellation("FAB123").unwrap().is_none());
    }

    #[test]
    fn test_delete_sale_scoped_to_employee() {
        let (_temp, store) = test_store();

        store
            .create_employee(&test_employee(
                "E10001",
                "jdoe",
                PassAllocations {
                    regular: 10,
                    ..Default::default()
                },
            ))
            .unwrap();
        store
            .create_sale(&test_sale("FAB123", "E10001", PassType::Regular, 2))
            .unwrap();

        // A different employee cannot delete the sale
        assert!(!store.delete_sale("FAB123", Some("E10002")).unwrap());
        assert!(store.delete_sale("FAB123", Some("E10001")).unwrap());
    }

    #[test]
    fn test_token_lookup_collision() {
        let (_temp, store) = test_store();

        let token1 = Token {
            id: "token-1".to_string(),
            token_hash: "hash1".to_string(),
            token_lookup: "lookup123".to_string(),
            is_admin: true,
            employee_id: None,
            created_at: Utc::now(),
            expires_at: None,
            last_used_at: None,
        };
        store.create_token(&token1).unwrap();
        assert!(store.has_admin_token().unwrap());

        let token2 = Token {
            id: "token-2".to_string(),
            token_hash: "hash2".to_string(),
            token_lookup: "lookup123".to_string(), // Same lookup
            is_admin: true,
            employee_id: None,
            created_at: Utc::now(),
            expires_at: None,
            last_used_at: None,
        };

        let result = store.create_token(&token2);
        assert!(matches!(result, Err(Error::TokenLookupCollision)));
    }

    #[test]
    fn test_monthly_summary_filters_by_purchase_month() {
        let (_temp, store) = test_store();

        store
            .create_employee(&test_employee(
                "E10001",
                "jdoe",
                PassAllocations {
                    regular: 100,
                    ..Default::default()
                },
            ))
            .unwrap();

        let mut old_sale = test_sale("FAB123", "E10001", PassType::Regular, 3);
        old_sale.purchased_date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        store.create_sale(&old_sale).unwrap();

        let current = test_sale("FAB124", "E10001", PassType::Regular, 2);
        store.create_sale(&current).unwrap();

        let all_time = store.sales_summary(Some("E10001"), None).unwrap();
        assert_eq!(all_time.gross_tickets, 5);

        let january = store
            .sales_summary(Some("E10001"), Some("2024-01"))
            .unwrap();
        assert_eq!(january.gross_tickets, 3);
        assert_eq!(january.gross_amount, 3900.00);
    }

    #[test]
    fn test_pass_type_breakdown_sorted_descending() {
        let (_temp, store) = test_store();

        store
            .create_employee(&test_employee(
                "E10001",
                "jdoe",
                PassAllocations {
                    regular: 100,
                    express: 100,
                    ..Default::default()
                },
            ))
            .unwrap();
        store
            .create_sale(&test_sale("FAB123", "E10001", PassType::Regular, 2))
            .unwrap();
        store
            .create_sale(&test_sale("FAB124", "E10001", PassType::Express, 9))
            .unwrap();

        let breakdown = store.pass_type_breakdown(Some("E10001")).unwrap();
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].pass_type, PassType::Express);
        assert_eq!(breakdown[0].tickets_sold, 9);
        assert_eq!(breakdown[1].tickets_sold, 2);
    }
}
