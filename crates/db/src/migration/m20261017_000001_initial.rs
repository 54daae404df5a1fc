//! Initial database migration.
//!
//! Creates the inventory tables, enums, triggers and RLS policies.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: TENANTS & MASTER DATA
        // ============================================================
        db.execute_unprepared(ORGANIZATIONS_SQL).await?;
        db.execute_unprepared(SUPPLIERS_SQL).await?;
        db.execute_unprepared(PRODUCTS_SQL).await?;
        db.execute_unprepared(WAREHOUSES_SQL).await?;

        // ============================================================
        // PART 3: STOCK & MOVEMENT LEDGER
        // ============================================================
        db.execute_unprepared(STOCKS_SQL).await?;
        db.execute_unprepared(STOCK_MOVEMENTS_SQL).await?;

        // ============================================================
        // PART 4: PURCHASING
        // ============================================================
        db.execute_unprepared(PURCHASE_ORDERS_SQL).await?;
        db.execute_unprepared(PURCHASE_ORDER_ITEMS_SQL).await?;

        // ============================================================
        // PART 5: STOCK ADJUSTMENTS
        // ============================================================
        db.execute_unprepared(STOCK_ADJUSTMENTS_SQL).await?;
        db.execute_unprepared(STOCK_ADJUSTMENT_ITEMS_SQL).await?;

        // ============================================================
        // PART 6: SALES & SHIPMENTS
        // ============================================================
        db.execute_unprepared(SALES_ORDERS_SQL).await?;
        db.execute_unprepared(SALES_ORDER_ITEMS_SQL).await?;
        db.execute_unprepared(SHIPMENTS_SQL).await?;

        // ============================================================
        // PART 7: DOCUMENT NUMBERING
        // ============================================================
        db.execute_unprepared(DOCUMENT_SEQUENCES_SQL).await?;

        // ============================================================
        // PART 8: TRIGGERS & FUNCTIONS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        // ============================================================
        // PART 9: ROW-LEVEL SECURITY
        // ============================================================
        db.execute_unprepared(RLS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Stock movement direction
CREATE TYPE stock_movement_type AS ENUM (
    'in',
    'out',
    'transfer_in',
    'transfer_out',
    'adjustment'
);

-- Purchase order lifecycle
CREATE TYPE purchase_order_status AS ENUM ('draft', 'ordered', 'received', 'cancelled');

-- Stock adjustment lifecycle
CREATE TYPE stock_adjustment_status AS ENUM ('draft', 'approved', 'cancelled');

-- Sales order lifecycle
CREATE TYPE sales_order_status AS ENUM (
    'draft',
    'confirmed',
    'shipped',
    'delivered',
    'cancelled',
    'returned'
);

-- Shipment lifecycle
CREATE TYPE shipment_status AS ENUM ('pending', 'shipped', 'delivered', 'cancelled');
";

const ORGANIZATIONS_SQL: &str = r"
CREATE TABLE organizations (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    slug VARCHAR(100) NOT NULL UNIQUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const SUPPLIERS_SQL: &str = r"
CREATE TABLE suppliers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255),
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_suppliers_org ON suppliers(organization_id);
";

const PRODUCTS_SQL: &str = r"
CREATE TABLE products (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    sku VARCHAR(100) NOT NULL,
    name VARCHAR(255) NOT NULL,
    unit VARCHAR(20) NOT NULL DEFAULT 'pcs',
    cost_price NUMERIC(19, 4) NOT NULL DEFAULT 0,
    selling_price NUMERIC(19, 4) NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (organization_id, sku)
);

CREATE INDEX idx_products_org ON products(organization_id);
";

const WAREHOUSES_SQL: &str = r"
CREATE TABLE warehouses (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    code VARCHAR(50) NOT NULL,
    name VARCHAR(255) NOT NULL,
    address TEXT,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (organization_id, code)
);

CREATE INDEX idx_warehouses_org ON warehouses(organization_id);
";

const STOCKS_SQL: &str = r"
CREATE TABLE stocks (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    product_id UUID NOT NULL REFERENCES products(id) ON DELETE CASCADE,
    warehouse_id UUID NOT NULL REFERENCES warehouses(id) ON DELETE CASCADE,
    quantity NUMERIC(19, 4) NOT NULL DEFAULT 0,
    version BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (product_id, warehouse_id),
    CONSTRAINT chk_stock_non_negative CHECK (quantity >= 0)
);

CREATE INDEX idx_stocks_org ON stocks(organization_id);
CREATE INDEX idx_stocks_org_quantity ON stocks(organization_id, quantity);
";

const STOCK_MOVEMENTS_SQL: &str = r"
CREATE TABLE stock_movements (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    product_id UUID NOT NULL REFERENCES products(id),
    warehouse_id UUID NOT NULL REFERENCES warehouses(id),
    movement_type stock_movement_type NOT NULL,
    quantity NUMERIC(19, 4) NOT NULL,
    previous_quantity NUMERIC(19, 4) NOT NULL,
    new_quantity NUMERIC(19, 4) NOT NULL,
    reference_type VARCHAR(32) NOT NULL,
    reference_id UUID,
    unit_cost NUMERIC(19, 4),
    note TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_reference_type CHECK (
        reference_type IN ('PurchaseOrder', 'Adjustment', 'Shipment', 'Manual')
    ),
    CONSTRAINT chk_movement_quantity CHECK (
        movement_type = 'adjustment' OR quantity > 0
    ),
    CONSTRAINT chk_new_quantity_non_negative CHECK (new_quantity >= 0)
);

CREATE INDEX idx_sm_org_created ON stock_movements(organization_id, created_at DESC);
CREATE INDEX idx_sm_product ON stock_movements(product_id);
CREATE INDEX idx_sm_warehouse ON stock_movements(warehouse_id);
CREATE INDEX idx_sm_reference ON stock_movements(reference_id) WHERE reference_id IS NOT NULL;
";

const PURCHASE_ORDERS_SQL: &str = r"
CREATE TABLE purchase_orders (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    supplier_id UUID NOT NULL REFERENCES suppliers(id),
    order_number VARCHAR(50) NOT NULL,
    status purchase_order_status NOT NULL DEFAULT 'draft',
    order_date DATE NOT NULL,
    expected_date DATE,
    total_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    notes TEXT,
    received_warehouse_id UUID REFERENCES warehouses(id),
    received_at TIMESTAMPTZ,
    received_by UUID,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (organization_id, order_number)
);

CREATE INDEX idx_po_org_status ON purchase_orders(organization_id, status);
CREATE INDEX idx_po_supplier ON purchase_orders(supplier_id);
";

const PURCHASE_ORDER_ITEMS_SQL: &str = r"
CREATE TABLE purchase_order_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    purchase_order_id UUID NOT NULL REFERENCES purchase_orders(id) ON DELETE CASCADE,
    product_id UUID NOT NULL REFERENCES products(id),
    line_number INTEGER NOT NULL,
    quantity NUMERIC(19, 4) NOT NULL,
    unit_price NUMERIC(19, 4) NOT NULL,
    total NUMERIC(19, 4) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_poi_quantity_positive CHECK (quantity > 0),
    CONSTRAINT chk_poi_price_non_negative CHECK (unit_price >= 0)
);

CREATE INDEX idx_poi_order ON purchase_order_items(purchase_order_id);
";

const STOCK_ADJUSTMENTS_SQL: &str = r"
CREATE TABLE stock_adjustments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    warehouse_id UUID NOT NULL REFERENCES warehouses(id),
    adjustment_number VARCHAR(50) NOT NULL,
    adjustment_date DATE NOT NULL,
    reason TEXT NOT NULL,
    notes TEXT,
    status stock_adjustment_status NOT NULL DEFAULT 'draft',
    approved_by UUID,
    approved_at TIMESTAMPTZ,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (organization_id, adjustment_number)
);

CREATE INDEX idx_sa_org_status ON stock_adjustments(organization_id, status);
";

const STOCK_ADJUSTMENT_ITEMS_SQL: &str = r"
CREATE TABLE stock_adjustment_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    adjustment_id UUID NOT NULL REFERENCES stock_adjustments(id) ON DELETE CASCADE,
    product_id UUID NOT NULL REFERENCES products(id),
    system_quantity NUMERIC(19, 4) NOT NULL,
    actual_quantity NUMERIC(19, 4) NOT NULL,
    difference NUMERIC(19, 4) NOT NULL,
    note TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (adjustment_id, product_id),
    CONSTRAINT chk_sai_actual_non_negative CHECK (actual_quantity >= 0),
    CONSTRAINT chk_sai_difference CHECK (difference = actual_quantity - system_quantity)
);

CREATE INDEX idx_sai_adjustment ON stock_adjustment_items(adjustment_id);
";

const SALES_ORDERS_SQL: &str = r"
CREATE TABLE sales_orders (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    order_number VARCHAR(50) NOT NULL,
    customer_id UUID NOT NULL,
    status sales_order_status NOT NULL DEFAULT 'draft',
    order_date DATE NOT NULL,
    expected_shipment_date DATE,
    shipping_address TEXT,
    notes TEXT,
    subtotal NUMERIC(19, 4) NOT NULL DEFAULT 0,
    tax_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    discount_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    total_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    source_invoice_id UUID,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (organization_id, order_number),
    UNIQUE (organization_id, source_invoice_id)
);

CREATE INDEX idx_so_org_status ON sales_orders(organization_id, status);
CREATE INDEX idx_so_customer ON sales_orders(customer_id);
";

const SALES_ORDER_ITEMS_SQL: &str = r"
CREATE TABLE sales_order_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    sales_order_id UUID NOT NULL REFERENCES sales_orders(id) ON DELETE CASCADE,
    product_id UUID NOT NULL REFERENCES products(id),
    line_number INTEGER NOT NULL,
    quantity NUMERIC(19, 4) NOT NULL,
    unit_price NUMERIC(19, 4) NOT NULL,
    tax_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    discount_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    total NUMERIC(19, 4) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_soi_quantity_positive CHECK (quantity > 0)
);

CREATE INDEX idx_soi_order ON sales_order_items(sales_order_id);
";

const SHIPMENTS_SQL: &str = r"
CREATE TABLE shipments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    sales_order_id UUID NOT NULL REFERENCES sales_orders(id),
    warehouse_id UUID NOT NULL REFERENCES warehouses(id),
    shipment_number VARCHAR(50) NOT NULL,
    status shipment_status NOT NULL DEFAULT 'pending',
    carrier VARCHAR(100),
    tracking_number VARCHAR(100),
    shipping_address TEXT,
    shipped_date TIMESTAMPTZ,
    delivered_date TIMESTAMPTZ,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (organization_id, shipment_number)
);

CREATE INDEX idx_shipments_order ON shipments(sales_order_id);
CREATE INDEX idx_shipments_org_status ON shipments(organization_id, status);
";

const DOCUMENT_SEQUENCES_SQL: &str = r"
CREATE TABLE document_sequences (
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    document_type VARCHAR(32) NOT NULL,
    year INTEGER NOT NULL,
    last_value BIGINT NOT NULL,
    PRIMARY KEY (organization_id, document_type, year)
);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- STOCK MOVEMENTS ARE APPEND-ONLY
-- Rows only disappear with their organization.
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_movement_modification()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'Stock movements are immutable';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_movement_update
    BEFORE UPDATE ON stock_movements
    FOR EACH ROW EXECUTE FUNCTION prevent_movement_modification();

-- ============================================================
-- APPROVED ADJUSTMENTS ARE FROZEN
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_approved_adjustment_modification()
RETURNS TRIGGER AS $$
BEGIN
    IF OLD.status <> 'draft' THEN
        RAISE EXCEPTION 'Cannot modify % stock adjustment', OLD.status;
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_approved_adjustment_mod
    BEFORE UPDATE ON stock_adjustments
    FOR EACH ROW EXECUTE FUNCTION prevent_approved_adjustment_modification();
";

const RLS_SQL: &str = r"
-- ============================================================
-- ROW-LEVEL SECURITY POLICIES
-- Application sets context per transaction:
-- SET LOCAL app.current_organization_id = 'org-uuid';
-- ============================================================

ALTER TABLE organizations ENABLE ROW LEVEL SECURITY;
ALTER TABLE suppliers ENABLE ROW LEVEL SECURITY;
ALTER TABLE products ENABLE ROW LEVEL SECURITY;
ALTER TABLE warehouses ENABLE ROW LEVEL SECURITY;
ALTER TABLE stocks ENABLE ROW LEVEL SECURITY;
ALTER TABLE stock_movements ENABLE ROW LEVEL SECURITY;
ALTER TABLE purchase_orders ENABLE ROW LEVEL SECURITY;
ALTER TABLE purchase_order_items ENABLE ROW LEVEL SECURITY;
ALTER TABLE stock_adjustments ENABLE ROW LEVEL SECURITY;
ALTER TABLE stock_adjustment_items ENABLE ROW LEVEL SECURITY;
ALTER TABLE sales_orders ENABLE ROW LEVEL SECURITY;
ALTER TABLE sales_order_items ENABLE ROW LEVEL SECURITY;
ALTER TABLE shipments ENABLE ROW LEVEL SECURITY;
ALTER TABLE document_sequences ENABLE ROW LEVEL SECURITY;

CREATE POLICY tenant_isolation ON organizations
    USING (id = current_setting('app.current_organization_id', true)::UUID);

CREATE POLICY tenant_isolation ON suppliers
    USING (organization_id = current_setting('app.current_organization_id', true)::UUID);

CREATE POLICY tenant_isolation ON products
    USING (organization_id = current_setting('app.current_organization_id', true)::UUID);

CREATE POLICY tenant_isolation ON warehouses
    USING (organization_id = current_setting('app.current_organization_id', true)::UUID);

CREATE POLICY tenant_isolation ON stocks
    USING (organization_id = current_setting('app.current_organization_id', true)::UUID);

CREATE POLICY tenant_isolation ON stock_movements
    USING (organization_id = current_setting('app.current_organization_id', true)::UUID);

CREATE POLICY tenant_isolation ON purchase_orders
    USING (organization_id = current_setting('app.current_organization_id', true)::UUID);

CREATE POLICY tenant_isolation ON stock_adjustments
    USING (organization_id = current_setting('app.current_organization_id', true)::UUID);

CREATE POLICY tenant_isolation ON sales_orders
    USING (organization_id = current_setting('app.current_organization_id', true)::UUID);

CREATE POLICY tenant_isolation ON shipments
    USING (organization_id = current_setting('app.current_organization_id', true)::UUID);

CREATE POLICY tenant_isolation ON document_sequences
    USING (organization_id = current_setting('app.current_organization_id', true)::UUID);

-- Line tables inherit isolation from their parent document
CREATE POLICY tenant_isolation ON purchase_order_items
    USING (purchase_order_id IN (
        SELECT id FROM purchase_orders
        WHERE organization_id = current_setting('app.current_organization_id', true)::UUID
    ));

CREATE POLICY tenant_isolation ON stock_adjustment_items
    USING (adjustment_id IN (
        SELECT id FROM stock_adjustments
        WHERE organization_id = current_setting('app.current_organization_id', true)::UUID
    ));

CREATE POLICY tenant_isolation ON sales_order_items
    USING (sales_order_id IN (
        SELECT id FROM sales_orders
        WHERE organization_id = current_setting('app.current_organization_id', true)::UUID
    ));
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

-- Drop triggers
DROP TRIGGER IF EXISTS trg_prevent_approved_adjustment_mod ON stock_adjustments;
DROP TRIGGER IF EXISTS trg_prevent_movement_update ON stock_movements;

-- Drop functions
DROP FUNCTION IF EXISTS prevent_approved_adjustment_modification();
DROP FUNCTION IF EXISTS prevent_movement_modification();

-- Drop tables (reverse order of creation)
DROP TABLE IF EXISTS document_sequences CASCADE;
DROP TABLE IF EXISTS shipments CASCADE;
DROP TABLE IF EXISTS sales_order_items CASCADE;
DROP TABLE IF EXISTS sales_orders CASCADE;
DROP TABLE IF EXISTS stock_adjustment_items CASCADE;
DROP TABLE IF EXISTS stock_adjustments CASCADE;
DROP TABLE IF EXISTS purchase_order_items CASCADE;
DROP TABLE IF EXISTS purchase_orders CASCADE;
DROP TABLE IF EXISTS stock_movements CASCADE;
DROP TABLE IF EXISTS stocks CASCADE;
DROP TABLE IF EXISTS warehouses CASCADE;
DROP TABLE IF EXISTS products CASCADE;
DROP TABLE IF EXISTS suppliers CASCADE;
DROP TABLE IF EXISTS organizations CASCADE;

-- Drop enums
DROP TYPE IF EXISTS shipment_status CASCADE;
DROP TYPE IF EXISTS sales_order_status CASCADE;
DROP TYPE IF EXISTS stock_adjustment_status CASCADE;
DROP TYPE IF EXISTS purchase_order_status CASCADE;
DROP TYPE IF EXISTS stock_movement_type CASCADE;
";
